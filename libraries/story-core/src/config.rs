/// Engine configuration
use crate::error::{Result, StoryError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_views")]
    pub views: ViewSettings,

    #[serde(default = "default_cache")]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Display time for image stories that carry no duration
    #[serde(default = "default_image_duration_ms")]
    pub default_image_duration_ms: u64,

    /// How often the session advances the image clock and dwell timer
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewSettings {
    /// Time a story must stay active before it counts as viewed
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    /// Number of leading groups prefetched after the feed loads
    #[serde(default = "default_prefetch_groups")]
    pub prefetch_groups: usize,

    /// Number of leading stories per group in the prefetch window
    #[serde(default = "default_prefetch_stories_per_group")]
    pub prefetch_stories_per_group: usize,

    /// Maximum concurrent prefetch resolutions
    #[serde(default = "default_prefetch_concurrency")]
    pub prefetch_concurrency: usize,

    /// Stories after the active one resolved in the background on activation
    #[serde(default = "default_prefetch_ahead")]
    pub prefetch_ahead: usize,
}

impl EngineConfig {
    /// Load configuration from `stories.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("stories.toml"))
    }

    /// Load configuration from a specific file (if present) and environment
    ///
    /// Environment variables use the `STORIES_` prefix and `__` as the
    /// section separator, e.g. `STORIES_VIEWS__DWELL_MS=1500`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("STORIES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| StoryError::Config(e.to_string()))?;

        let engine: Self = config
            .try_deserialize()
            .map_err(|e| StoryError::Config(e.to_string()))?;

        engine.validate()?;
        Ok(engine)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.default_image_duration_ms == 0 {
            return Err(StoryError::Config(
                "playback.default_image_duration_ms must be positive".to_string(),
            ));
        }

        if self.playback.tick_interval_ms == 0 {
            return Err(StoryError::Config(
                "playback.tick_interval_ms must be positive".to_string(),
            ));
        }

        if self.cache.prefetch_concurrency == 0 {
            return Err(StoryError::Config(
                "cache.prefetch_concurrency must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl PlaybackSettings {
    pub fn default_image_duration(&self) -> Duration {
        Duration::from_millis(self.default_image_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl ViewSettings {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

impl CacheSettings {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

// Default values
fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        default_image_duration_ms: default_image_duration_ms(),
        tick_interval_ms: default_tick_interval_ms(),
    }
}

fn default_image_duration_ms() -> u64 {
    5000
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_views() -> ViewSettings {
    ViewSettings {
        dwell_ms: default_dwell_ms(),
    }
}

fn default_dwell_ms() -> u64 {
    1000
}

fn default_cache() -> CacheSettings {
    CacheSettings {
        directory: default_cache_directory(),
        signed_url_ttl_secs: default_signed_url_ttl_secs(),
        prefetch_groups: default_prefetch_groups(),
        prefetch_stories_per_group: default_prefetch_stories_per_group(),
        prefetch_concurrency: default_prefetch_concurrency(),
        prefetch_ahead: default_prefetch_ahead(),
    }
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("./cache/stories")
}

fn default_signed_url_ttl_secs() -> u64 {
    3600
}

fn default_prefetch_groups() -> usize {
    3
}

fn default_prefetch_stories_per_group() -> usize {
    2
}

fn default_prefetch_concurrency() -> usize {
    3
}

fn default_prefetch_ahead() -> usize {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            views: default_views(),
            cache: default_cache(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playback.default_image_duration(), Duration::from_secs(5));
        assert_eq!(config.views.dwell(), Duration::from_secs(1));
        assert_eq!(config.cache.prefetch_concurrency, 3);
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let mut config = EngineConfig::default();
        config.playback.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(StoryError::Config(_))));
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stories.toml");
        std::fs::write(
            &path,
            "[views]\ndwell_ms = 2500\n\n[cache]\nprefetch_groups = 5\n",
        )
        .unwrap();

        let config = EngineConfig::load_from(&path).unwrap();
        assert_eq!(config.views.dwell_ms, 2500);
        assert_eq!(config.cache.prefetch_groups, 5);
        assert_eq!(config.cache.prefetch_stories_per_group, 2);
        assert_eq!(config.playback.tick_interval_ms, 50);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.playback.default_image_duration_ms, 5000);
    }
}
