//! Loading of individual narration parts into playable resources.
//!
//! The [`PartLoader`] owns the one live [`MediaResource`]. Every load is
//! stamped with a [`LoadToken`]; results and end-of-part notifications that
//! carry an older token are stale and get discarded.

use crate::playback::error::PlaybackError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Identifies one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken(u64);

/// Notifications from in-flight loads and live resources
pub enum LoaderEvent {
    Opened {
        token: LoadToken,
        result: Result<Box<dyn MediaResource>, PlaybackError>,
    },
    Ended {
        token: LoadToken,
    },
}

/// Handed to the backend so a resource can report reaching its end
#[derive(Clone)]
pub struct EndedSignal {
    token: LoadToken,
    tx: tokio_mpsc::UnboundedSender<LoaderEvent>,
}

impl EndedSignal {
    pub fn fire(&self) {
        let _ = self.tx.send(LoaderEvent::Ended { token: self.token });
    }
}

/// Opens part URLs into playable resources
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Resolves once the part can play through, or fails
    async fn open(
        &self,
        url: &str,
        ended: EndedSignal,
    ) -> Result<Box<dyn MediaResource>, PlaybackError>;
}

/// A single loaded part
///
/// Implementors must also release on drop.
pub trait MediaResource: Send {
    /// Err means the platform refused to start playback
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Position within this part, in seconds
    fn position(&self) -> f64;

    fn seek(&mut self, position: f64) -> Result<(), PlaybackError>;

    /// Stop buffering and detach from the output
    fn release(&mut self);
}

/// A part that finished loading and is now the live resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedPart {
    pub part_index: usize,
    pub start_offset: f64,
    pub is_playing: bool,
    /// Autoplay was requested but refused
    pub play_rejected: bool,
}

struct PendingLoad {
    token: LoadToken,
    url: String,
    part_index: usize,
    start_offset: f64,
    auto_play: bool,
    task: JoinHandle<()>,
}

/// Wraps part URLs in playable resources, one at a time
pub struct PartLoader {
    backend: Arc<dyn MediaBackend>,
    events_tx: tokio_mpsc::UnboundedSender<LoaderEvent>,
    current: Option<Box<dyn MediaResource>>,
    current_token: Option<LoadToken>,
    pending: Option<PendingLoad>,
    next_token: u64,
}

impl PartLoader {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        events_tx: tokio_mpsc::UnboundedSender<LoaderEvent>,
    ) -> Self {
        Self {
            backend,
            events_tx,
            current: None,
            current_token: None,
            pending: None,
            next_token: 1,
        }
    }

    /// Release whatever exists and start opening `url`.
    ///
    /// The result arrives later as [`LoaderEvent::Opened`] and must be passed
    /// to [`PartLoader::complete`].
    pub fn load(
        &mut self,
        url: &str,
        part_index: usize,
        start_offset: f64,
        auto_play: bool,
    ) -> LoadToken {
        self.release();

        let token = LoadToken(self.next_token);
        self.next_token += 1;

        debug!(
            "Loading part {} from {} (offset {:.2}s, autoplay {})",
            part_index, url, start_offset, auto_play
        );

        let backend = self.backend.clone();
        let events_tx = self.events_tx.clone();
        let ended = EndedSignal {
            token,
            tx: self.events_tx.clone(),
        };
        let task_url = url.to_string();
        let task = tokio::spawn(async move {
            let result = backend.open(&task_url, ended).await;
            let _ = events_tx.send(LoaderEvent::Opened { token, result });
        });

        self.pending = Some(PendingLoad {
            token,
            url: url.to_string(),
            part_index,
            start_offset,
            auto_play,
            task,
        });

        token
    }

    /// Apply an opened resource.
    ///
    /// Returns `None` when the token no longer matches the pending load; a
    /// stale resource is released before returning.
    pub fn complete(
        &mut self,
        token: LoadToken,
        result: Result<Box<dyn MediaResource>, PlaybackError>,
    ) -> Option<Result<LoadedPart, PlaybackError>> {
        let pending = match self.pending.take() {
            Some(pending) if pending.token == token => pending,
            other => {
                self.pending = other;
                debug!("Discarding stale part load {:?}", token);
                if let Ok(mut resource) = result {
                    resource.release();
                }
                return None;
            }
        };

        let mut resource = match result {
            Ok(resource) => resource,
            Err(e) => return Some(Err(e)),
        };

        if pending.start_offset > 0.0 {
            if let Err(e) = resource.seek(pending.start_offset) {
                resource.release();
                return Some(Err(PlaybackError::load_failed(
                    &pending.url,
                    e.to_string(),
                )));
            }
        }

        let mut play_rejected = false;
        let is_playing = if pending.auto_play {
            match resource.play() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Autoplay of part {} rejected: {}", pending.part_index, e);
                    play_rejected = true;
                    false
                }
            }
        } else {
            false
        };

        info!("Part {} ready ({})", pending.part_index, pending.url);

        self.current = Some(resource);
        self.current_token = Some(token);

        Some(Ok(LoadedPart {
            part_index: pending.part_index,
            start_offset: pending.start_offset,
            is_playing,
            play_rejected,
        }))
    }

    /// Whether `token` belongs to the live resource
    pub fn is_current(&self, token: LoadToken) -> bool {
        self.current.is_some() && self.current_token == Some(token)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the in-flight load will start playing once ready
    pub fn pending_auto_play(&self) -> Option<bool> {
        self.pending.as_ref().map(|pending| pending.auto_play)
    }

    pub fn resource(&mut self) -> Option<&mut (dyn MediaResource + 'static)> {
        self.current.as_deref_mut()
    }

    pub fn has_resource(&self) -> bool {
        self.current.is_some()
    }

    /// Drop the live resource and abandon any in-flight load
    pub fn release(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Abandoning in-flight load of part {}", pending.part_index);
            pending.task.abort();
        }
        if let Some(mut resource) = self.current.take() {
            resource.release();
        }
        self.current_token = None;
    }
}

impl Drop for PartLoader {
    fn drop(&mut self) {
        self.release();
    }
}
