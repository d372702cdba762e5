use crate::catalog::NarrationCatalog;
use crate::config;
use crate::playback;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub config: config::Config,
    pub catalog: Arc<NarrationCatalog>,
    pub playback_handle: playback::PlaybackHandle,
}
