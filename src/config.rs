use crate::playback::PlaybackConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Application configuration
/// In debug builds: loads a .env file first, then reads the environment
#[derive(Clone, Debug)]
pub struct Config {
    /// Narration catalog JSON
    pub catalog_path: PathBuf,
    /// Cadence of progress updates while playing
    pub frame_interval: Duration,
    /// Render silence instead of audio
    pub mute_audio: bool,
}

impl Config {
    /// Load configuration based on build mode
    pub fn load() -> Self {
        #[cfg(debug_assertions)]
        {
            if dotenvy::dotenv().is_ok() {
                info!("Config: Dev mode activated - loaded .env file");
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let catalog_path = lookup("BLOOM_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_catalog_path);

        let frame_interval_ms = lookup("BLOOM_FRAME_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_FRAME_INTERVAL_MS)
            .max(1);

        let mute_audio = lookup("BLOOM_MUTE_AUDIO")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        info!(
            "Config: catalog {}, frame interval {}ms{}",
            catalog_path.display(),
            frame_interval_ms,
            if mute_audio { ", audio muted" } else { "" }
        );

        Self {
            catalog_path,
            frame_interval: Duration::from_millis(frame_interval_ms),
            mute_audio,
        }
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            frame_interval: self.frame_interval,
        }
    }
}

/// `~/.bloom/narrations.json`, or relative to the working directory when
/// there is no home directory
fn default_catalog_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".bloom"))
        .unwrap_or_default()
        .join("narrations.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.frame_interval, Duration::from_millis(16));
        assert!(!config.mute_audio);
        assert!(config.catalog_path.ends_with("narrations.json"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BLOOM_CATALOG_PATH", "/srv/bloom/catalog.json"),
            ("BLOOM_FRAME_INTERVAL_MS", "33"),
            ("BLOOM_MUTE_AUDIO", "TRUE"),
        ]);
        assert_eq!(config.catalog_path, PathBuf::from("/srv/bloom/catalog.json"));
        assert_eq!(config.frame_interval, Duration::from_millis(33));
        assert!(config.mute_audio);
        assert_eq!(
            config.playback_config().frame_interval,
            Duration::from_millis(33)
        );
    }

    #[test]
    fn test_bad_interval_falls_back() {
        assert_eq!(
            config_from(&[("BLOOM_FRAME_INTERVAL_MS", "fast")]).frame_interval,
            Duration::from_millis(16)
        );
        assert_eq!(
            config_from(&[("BLOOM_FRAME_INTERVAL_MS", "0")]).frame_interval,
            Duration::from_millis(1)
        );
    }
}
