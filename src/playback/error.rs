use thiserror::Error;

/// Errors surfaced by narration playback
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("Invalid narration: {0}")]
    InvalidAudioInfo(String),
    #[error("Failed to load {url}: {message}")]
    LoadFailed { url: String, message: String },
    #[error("Playback was rejected: {0}")]
    PlaybackRejected(String),
    #[error("Seek failed: {0}")]
    Seek(String),
    #[error("Playback service is not running")]
    ServiceUnavailable,
}

impl PlaybackError {
    pub fn load_failed(url: &str, message: impl Into<String>) -> Self {
        PlaybackError::LoadFailed {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
