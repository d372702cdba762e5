use bloom::catalog::NarrationCatalog;
use bloom::config::Config;
use bloom::playback::{DesktopBackend, PlaybackService};
use bloom::ui::{make_config, App};
use bloom::AppContext;
use std::sync::Arc;
use tracing::{error, info};

fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let config = Config::load();

    let catalog = match NarrationCatalog::load(&config.catalog_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Starting with an empty catalog: {}", e);
            NarrationCatalog::default()
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(DesktopBackend::new(config.mute_audio));
    let playback_handle =
        PlaybackService::start(backend, config.playback_config(), runtime.handle().clone());

    let app_context = AppContext {
        config,
        catalog: Arc::new(catalog),
        playback_handle: playback_handle.clone(),
    };

    info!("Launching desktop app");
    dioxus::LaunchBuilder::desktop()
        .with_cfg(make_config())
        .with_context(app_context)
        .launch(App);

    playback_handle.shutdown();
}
