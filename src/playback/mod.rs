pub mod clock;
#[cfg(feature = "desktop")]
mod cpal_output;
#[cfg(feature = "desktop")]
pub mod desktop_backend;
pub mod error;
pub mod loader;
pub mod progress;
pub mod service;
mod symphonia_decoder;
pub mod timeline;
pub mod types;
pub mod visibility;

#[cfg(feature = "desktop")]
pub use desktop_backend::DesktopBackend;
pub use error::PlaybackError;
pub use loader::{EndedSignal, MediaBackend, MediaResource};
pub use progress::PlaybackProgress;
pub use service::{PlaybackConfig, PlaybackHandle, PlaybackService};
pub use types::{AudioInfo, AudioState, PlaybackContext, PlaybackPhase};
