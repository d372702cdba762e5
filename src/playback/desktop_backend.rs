//! Media backend for the desktop app: fetch, decode with symphonia, play via cpal.

use crate::playback::cpal_output::{AudioError, PartOutput};
use crate::playback::error::PlaybackError;
use crate::playback::loader::{EndedSignal, MediaBackend, MediaResource};
use crate::playback::symphonia_decoder::{extension_hint, PartDecoder};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

pub struct DesktopBackend {
    client: Client,
    volume: f32,
}

impl DesktopBackend {
    pub fn new(muted: bool) -> Self {
        Self {
            client: Client::new(),
            volume: if muted { 0.0 } else { 1.0 },
        }
    }

    /// Read the part's bytes from the network or the local filesystem
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlaybackError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| PlaybackError::load_failed(url, e.to_string()))?;
            let response = response
                .error_for_status()
                .map_err(|e| PlaybackError::load_failed(url, e.to_string()))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PlaybackError::load_failed(url, e.to_string()))?;
            Ok(bytes.to_vec())
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            tokio::fs::read(path)
                .await
                .map_err(|e| PlaybackError::load_failed(url, e.to_string()))
        }
    }
}

#[async_trait]
impl MediaBackend for DesktopBackend {
    async fn open(
        &self,
        url: &str,
        ended: EndedSignal,
    ) -> Result<Box<dyn MediaResource>, PlaybackError> {
        let data = self.fetch(url).await?;
        debug!("Fetched {} bytes for {}", data.len(), url);

        let hint = extension_hint(url).map(str::to_string);
        let decoder = tokio::task::spawn_blocking(move || PartDecoder::new(data, hint.as_deref()))
            .await
            .map_err(|e| PlaybackError::load_failed(url, e.to_string()))?
            .map_err(|e| PlaybackError::load_failed(url, e.to_string()))?;

        let output = PartOutput::start(decoder, self.volume, move || ended.fire())
            .await
            .map_err(|e| PlaybackError::load_failed(url, e.to_string()))?;

        info!("Opened {}", url);
        Ok(Box::new(DesktopResource {
            output: Some(output),
        }))
    }
}

struct DesktopResource {
    output: Option<PartOutput>,
}

impl DesktopResource {
    fn output(&self) -> Result<&PartOutput, AudioError> {
        self.output.as_ref().ok_or(AudioError::ThreadExited)
    }
}

impl MediaResource for DesktopResource {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.output()
            .and_then(PartOutput::play)
            .map_err(|e| PlaybackError::PlaybackRejected(e.to_string()))
    }

    fn pause(&mut self) {
        if let Some(output) = &self.output {
            output.pause();
        }
    }

    fn position(&self) -> f64 {
        self.output
            .as_ref()
            .map(|output| output.position().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn seek(&mut self, position: f64) -> Result<(), PlaybackError> {
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        self.output()
            .and_then(|output| output.seek(Duration::from_secs_f64(position)))
            .map_err(|e| PlaybackError::Seek(e.to_string()))
    }

    fn release(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.shutdown();
        }
    }
}

impl Drop for DesktopResource {
    fn drop(&mut self) {
        self.release();
    }
}
