// Configuration management for autoskip
// Handles loading/saving settings, with sensible defaults when config is missing.
// The skip interval has no default - it has to come from the file or the CLI.

use crate::error::ConfigError;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

/// One day. Keeps every deadline well inside what `Instant` can represent.
pub const MAX_SKIP_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const MAX_POLL_INTERVAL_MS: u64 = 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub skip_interval_secs: Option<u64>,
    pub poll_interval_ms: u64,
    pub event_buffer: usize,
    pub spotify: SpotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub api_base: String,
    pub access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_interval_secs: None,
            poll_interval_ms: 1000,
            event_buffer: 1,
            spotify: SpotifyConfig {
                api_base: "https://api.spotify.com/v1".to_string(),
                access_token: None,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = config_dir().ok_or(ConfigError::NoConfigDir)?.join("autoskip");

        Ok(config_dir.join("config.toml"))
    }

    /// A non-empty token from the environment beats the one in the file
    pub fn apply_env(&mut self) {
        self.apply_access_token(std::env::var(ACCESS_TOKEN_ENV).ok());
    }

    fn apply_access_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.spotify.access_token = Some(token.trim().to_string());
        }
    }

    /// Check everything the monitor needs before it starts.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let skip_interval = self
            .skip_interval_secs
            .ok_or(ConfigError::MissingSkipInterval)
            .and_then(SkipInterval::from_secs)?;

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::InvalidEventBuffer);
        }

        Ok(Settings {
            skip_interval,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            event_buffer: self.event_buffer,
        })
    }
}

/// How long to listen before skipping. Always a positive whole number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipInterval(Duration);

impl SkipInterval {
    pub fn from_secs(secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::ZeroSkipInterval);
        }
        if secs > MAX_SKIP_INTERVAL_SECS {
            return Err(ConfigError::SkipIntervalTooLong { secs, max: MAX_SKIP_INTERVAL_SECS });
        }
        Ok(Self(Duration::from_secs(secs)))
    }

    /// Parse user input like "30" or " 45\n"
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim();
        let secs: i64 = trimmed
            .parse()
            .map_err(|_| ConfigError::InvalidSkipInterval(trimmed.to_string()))?;

        if secs < 0 {
            return Err(ConfigError::InvalidSkipInterval(trimmed.to_string()));
        }
        Self::from_secs(secs as u64)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for SkipInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs())
    }
}

/// Validated runtime settings handed to the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub skip_interval: SkipInterval,
    pub poll_interval: Duration,
    pub event_buffer: usize,
}

impl Settings {
    pub fn new(skip_interval: SkipInterval) -> Self {
        Self {
            skip_interval,
            poll_interval: Duration::from_secs(1),
            event_buffer: 1,
        }
    }
}
