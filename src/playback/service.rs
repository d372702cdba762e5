use crate::playback::clock::ProgressClock;
use crate::playback::error::PlaybackError;
use crate::playback::loader::{LoadToken, LoaderEvent, MediaBackend, MediaResource, PartLoader};
use crate::playback::progress::{PlaybackProgress, PlaybackProgressHandle};
use crate::playback::timeline;
use crate::playback::types::{AudioInfo, AudioState, PlaybackContext, PlaybackPhase};
use crate::playback::visibility;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Playback commands sent to the service
#[derive(Debug)]
pub enum PlaybackCommand {
    Start {
        info: AudioInfo,
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    Stop,
    TogglePlayPause {
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    Seek(f64),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// How often the published position is refreshed while playing
    pub frame_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
        }
    }
}

/// Handle to the playback service for sending commands
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: tokio_mpsc::UnboundedSender<PlaybackCommand>,
    state_rx: watch::Receiver<Option<AudioState>>,
    page_tx: Arc<watch::Sender<PlaybackContext>>,
    progress_handle: PlaybackProgressHandle,
}

impl PlaybackHandle {
    /// Start a narration, replacing whatever is playing.
    ///
    /// Resolves once the first part has loaded, failed, or been superseded.
    pub async fn start_audio(&self, info: AudioInfo) -> Result<(), PlaybackError> {
        info.validate()?;
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(PlaybackCommand::Start { info, reply })
            .map_err(|_| PlaybackError::ServiceUnavailable)?;
        reply_rx
            .await
            .map_err(|_| PlaybackError::ServiceUnavailable)?
    }

    pub fn stop_audio(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Stop);
    }

    /// Pause or resume. After the end this replays from the start; after a
    /// failed load it reloads the failed part at the current position.
    pub async fn toggle_play_pause(&self) -> Result<(), PlaybackError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(PlaybackCommand::TogglePlayPause { reply })
            .map_err(|_| PlaybackError::ServiceUnavailable)?;
        reply_rx
            .await
            .map_err(|_| PlaybackError::ServiceUnavailable)?
    }

    /// Seek to a position in the whole narration, in seconds
    pub fn seek_to(&self, virtual_time: f64) {
        let _ = self.command_tx.send(PlaybackCommand::Seek(virtual_time));
    }

    /// Stop playback and end the service task
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(PlaybackCommand::Shutdown);
    }

    /// Current snapshot, `None` when nothing is playing
    pub fn audio_state(&self) -> Option<AudioState> {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<Option<AudioState>> {
        self.state_rx.clone()
    }

    pub fn subscribe_progress(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        self.progress_handle.subscribe_all()
    }

    pub fn set_current_page_story_id(&self, story_id: Option<i64>) {
        self.page_tx.send_if_modified(|page| {
            if page.story_id == story_id {
                return false;
            }
            page.story_id = story_id;
            true
        });
    }

    pub fn set_current_section(&self, section_name: impl Into<String>) {
        let section_name = section_name.into();
        self.page_tx.send_if_modified(|page| {
            if page.section_name == section_name {
                return false;
            }
            page.section_name = section_name;
            true
        });
    }

    pub fn page_context(&self) -> PlaybackContext {
        self.page_tx.borrow().clone()
    }

    pub fn subscribe_page_context(&self) -> watch::Receiver<PlaybackContext> {
        self.page_tx.subscribe()
    }

    pub fn is_on_audio_section(&self) -> bool {
        let state = self.state_rx.borrow();
        let page = self.page_tx.borrow();
        visibility::is_on_audio_section(state.as_ref(), &page)
    }

    pub fn should_show_mini_player(&self) -> bool {
        let state = self.state_rx.borrow();
        let page = self.page_tx.borrow();
        visibility::should_show_mini_player(state.as_ref(), &page)
    }
}

/// Playback service that owns the one live narration resource
pub struct PlaybackService {
    command_rx: tokio_mpsc::UnboundedReceiver<PlaybackCommand>,
    loader_rx: tokio_mpsc::UnboundedReceiver<LoaderEvent>,
    progress_tx: tokio_mpsc::UnboundedSender<PlaybackProgress>,
    state_tx: watch::Sender<Option<AudioState>>,
    loader: PartLoader,
    clock: ProgressClock,
    state: Option<AudioState>,
    /// Reply for the `start_audio` call waiting on the first part
    pending_start: Option<oneshot::Sender<Result<(), PlaybackError>>>,
}

impl PlaybackService {
    pub fn start(
        backend: Arc<dyn MediaBackend>,
        config: PlaybackConfig,
        runtime_handle: tokio::runtime::Handle,
    ) -> PlaybackHandle {
        let (command_tx, command_rx) = tokio_mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = tokio_mpsc::unbounded_channel();
        let (loader_tx, loader_rx) = tokio_mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(None);
        let (page_tx, _page_rx) = watch::channel(PlaybackContext::default());

        let progress_handle = PlaybackProgressHandle::new(progress_rx, runtime_handle.clone());

        let service = PlaybackService {
            command_rx,
            loader_rx,
            progress_tx,
            state_tx,
            loader: PartLoader::new(backend, loader_tx),
            clock: ProgressClock::new(config.frame_interval),
            state: None,
            pending_start: None,
        };
        runtime_handle.spawn(service.run());

        PlaybackHandle {
            command_tx,
            state_rx,
            page_tx: Arc::new(page_tx),
            progress_handle,
        }
    }

    async fn run(mut self) {
        info!("PlaybackService started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(PlaybackCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.loader_rx.recv() => match event {
                    LoaderEvent::Opened { token, result } => self.on_part_opened(token, result),
                    LoaderEvent::Ended { token } => self.on_part_ended(token),
                },
                _ = self.clock.next_frame() => self.on_frame(),
            }
        }

        self.stop();
        info!("PlaybackService stopped");
    }

    fn handle_command(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Start { info, reply } => self.start_audio(info, reply),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::TogglePlayPause { reply } => {
                let _ = reply.send(self.toggle_play_pause());
            }
            PlaybackCommand::Seek(virtual_time) => {
                if let Err(e) = self.reposition(virtual_time, None) {
                    warn!("Seek to {:.2}s failed: {}", virtual_time, e);
                }
            }
            PlaybackCommand::Shutdown => {}
        }
    }

    fn start_audio(
        &mut self,
        info: AudioInfo,
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    ) {
        if let Err(e) = info.validate() {
            let _ = reply.send(Err(e));
            return;
        }

        info!(
            "Starting narration '{}' of story {:?} ({} parts)",
            info.section_name,
            info.story_id,
            info.part_count()
        );

        // Whatever was playing goes first, unconditionally
        self.clock.stop();
        self.loader.release();

        self.emit(PlaybackProgress::NarrationStarted {
            story_id: info.story_id,
            section_name: info.section_name.clone(),
            part_count: info.part_count(),
        });
        self.state = Some(AudioState::starting(info));
        self.begin_load(0, 0.0, true);
        self.pending_start = Some(reply);
        self.publish();
    }

    fn stop(&mut self) {
        self.clock.stop();
        self.loader.release();
        self.resolve_pending_start(Ok(()));

        if let Some(state) = self.state.take() {
            info!("Stopped narration '{}'", state.info.section_name);
            self.emit(PlaybackProgress::Stopped);
        }
        self.publish();
    }

    fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        let (is_playing, phase, current_time) = match self.state.as_ref() {
            Some(state) => (state.is_playing, state.phase(), state.current_time),
            None => return Ok(()),
        };

        if !self.loader.has_resource() {
            if phase == PlaybackPhase::Error {
                info!("Retrying failed part at {:.2}s", current_time);
                return self.reposition(current_time, Some(true));
            }
            return Ok(());
        }

        if phase == PlaybackPhase::Ended {
            debug!("Replaying finished narration");
            return self.reposition(0.0, Some(true));
        }

        let result = match self.loader.resource() {
            Some(resource) if is_playing => {
                resource.pause();
                Ok(false)
            }
            Some(resource) => resource.play().map(|()| true),
            None => return Ok(()),
        };

        match result {
            Ok(now_playing) => {
                if let Some(state) = self.state.as_mut() {
                    state.is_playing = now_playing;
                }
                if now_playing {
                    self.clock.start();
                } else {
                    self.clock.stop();
                }
                self.publish();
                Ok(())
            }
            Err(e) => {
                warn!("Play rejected: {}", e);
                let part_index = self.current_part_index();
                self.emit(PlaybackProgress::PlaybackRejected {
                    part_index,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Move to `virtual_time`. `play` forces the resulting play state;
    /// `None` keeps whatever playback was doing or about to do.
    fn reposition(&mut self, virtual_time: f64, play: Option<bool>) -> Result<(), PlaybackError> {
        let (target, part_index, offset, current_part, was_playing) = match self.state.as_ref() {
            Some(state) => {
                let target = timeline::clamp_virtual_time(virtual_time, state.duration);
                let (part_index, offset) = timeline::locate(target, &state.info.part_durations);
                let was_playing = self
                    .loader
                    .pending_auto_play()
                    .unwrap_or(state.is_playing);
                (
                    target,
                    part_index,
                    offset,
                    state.current_part_index,
                    was_playing,
                )
            }
            None => return Ok(()),
        };
        let should_play = play.unwrap_or(was_playing);

        debug!(
            "Seek to {:.2}s -> part {} at {:.2}s",
            target, part_index, offset
        );

        if part_index == current_part && self.loader.has_resource() {
            let mut now_playing = was_playing;
            if let Some(resource) = self.loader.resource() {
                resource.seek(offset)?;
                if should_play && !was_playing {
                    now_playing = Self::try_play(resource);
                }
            }
            if let Some(state) = self.state.as_mut() {
                state.current_time = target;
                state.is_playing = now_playing;
            }
            if now_playing {
                self.clock.start();
            }
        } else {
            if let Some(state) = self.state.as_mut() {
                state.current_time = target;
                state.is_playing = should_play;
            }
            self.begin_load(part_index, offset, should_play);
        }

        self.emit(PlaybackProgress::Seeked {
            virtual_time: target,
            part_index,
        });
        self.publish();
        Ok(())
    }

    fn try_play(resource: &mut dyn MediaResource) -> bool {
        match resource.play() {
            Ok(()) => true,
            Err(e) => {
                warn!("Play rejected: {}", e);
                false
            }
        }
    }

    /// Tear down the live part and start loading `part_index`
    fn begin_load(&mut self, part_index: usize, start_offset: f64, auto_play: bool) {
        self.clock.stop();
        self.resolve_pending_start(Ok(()));

        let url = match self.state.as_mut() {
            Some(state) => match state.info.audio_sources.get(part_index) {
                Some(url) => {
                    state.is_loading = true;
                    state.error = None;
                    state.current_part_index = part_index;
                    url.clone()
                }
                None => return,
            },
            None => return,
        };

        self.loader.load(&url, part_index, start_offset, auto_play);
    }

    fn on_part_opened(
        &mut self,
        token: LoadToken,
        result: Result<Box<dyn MediaResource>, PlaybackError>,
    ) {
        let outcome = match self.loader.complete(token, result) {
            Some(outcome) => outcome,
            None => return,
        };

        let state = match self.state.as_mut() {
            Some(state) => state,
            None => {
                self.loader.release();
                return;
            }
        };
        state.is_loading = false;

        match outcome {
            Ok(loaded) => {
                state.current_part_index = loaded.part_index;
                state.is_playing = loaded.is_playing;
                state.current_time = timeline::clamp_virtual_time(
                    timeline::cumulative_time(
                        &state.info.part_durations,
                        loaded.part_index,
                        loaded.start_offset,
                    ),
                    state.duration,
                );

                if loaded.play_rejected {
                    let _ = self.progress_tx.send(PlaybackProgress::PlaybackRejected {
                        part_index: loaded.part_index,
                        message: "autoplay was refused".to_string(),
                    });
                }
                let _ = self.progress_tx.send(PlaybackProgress::PartReady {
                    part_index: loaded.part_index,
                    is_playing: loaded.is_playing,
                });

                if loaded.is_playing {
                    self.clock.start();
                }
                self.resolve_pending_start(Ok(()));
            }
            Err(e) => {
                error!(
                    "Part {} of '{}' failed to load: {}",
                    state.current_part_index, state.info.section_name, e
                );
                state.is_playing = false;
                state.error = Some(e.to_string());
                let _ = self.progress_tx.send(PlaybackProgress::LoadFailed {
                    part_index: state.current_part_index,
                    message: e.to_string(),
                });

                self.clock.stop();
                self.resolve_pending_start(Err(e));
            }
        }

        self.publish();
    }

    fn on_part_ended(&mut self, token: LoadToken) {
        if !self.loader.is_current(token) {
            debug!("Ignoring end of a part that is no longer live");
            return;
        }
        self.clock.stop();

        let (from_part, part_count) = match self.state.as_ref() {
            Some(state) => (state.current_part_index, state.info.part_count()),
            None => return,
        };

        if from_part + 1 < part_count {
            let to_part = from_part + 1;
            info!("Part {} finished, advancing to part {}", from_part, to_part);
            if let Some(state) = self.state.as_mut() {
                state.current_time =
                    timeline::cumulative_time(&state.info.part_durations, to_part, 0.0);
                state.is_playing = true;
            }
            self.emit(PlaybackProgress::PartAdvanced { from_part, to_part });
            self.begin_load(to_part, 0.0, true);
        } else if let Some(state) = self.state.as_mut() {
            info!("Narration '{}' finished", state.info.section_name);
            state.is_playing = false;
            state.current_time = state.duration;
            let _ = self.progress_tx.send(PlaybackProgress::NarrationCompleted {
                story_id: state.info.story_id,
                section_name: state.info.section_name.clone(),
            });
        }

        self.publish();
    }

    fn on_frame(&mut self) {
        let position = match self.loader.resource() {
            Some(resource) => resource.position(),
            None => {
                self.clock.stop();
                return;
            }
        };

        let advanced = match self.state.as_mut() {
            Some(state) if state.is_playing && !state.is_loading => {
                let virtual_time = timeline::cumulative_time(
                    &state.info.part_durations,
                    state.current_part_index,
                    position,
                )
                .min(state.duration);
                if virtual_time > state.current_time {
                    state.current_time = virtual_time;
                    true
                } else {
                    false
                }
            }
            _ => {
                self.clock.stop();
                false
            }
        };

        if advanced {
            self.publish();
        }
    }

    fn current_part_index(&self) -> usize {
        self.state
            .as_ref()
            .map(|state| state.current_part_index)
            .unwrap_or(0)
    }

    fn resolve_pending_start(&mut self, result: Result<(), PlaybackError>) {
        if let Some(reply) = self.pending_start.take() {
            let _ = reply.send(result);
        }
    }

    fn emit(&self, progress: PlaybackProgress) {
        let _ = self.progress_tx.send(progress);
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|published| {
            if *published == self.state {
                return false;
            }
            *published = self.state.clone();
            true
        });
    }
}
