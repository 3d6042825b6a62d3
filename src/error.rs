// Error types for autoskip
// Config errors are fatal before the loop starts, source errors never are

use thiserror::Error;

/// Problems with the startup settings. Reported once, the monitor never starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Skip interval must be a whole number of seconds, got '{0}'")]
    InvalidSkipInterval(String),

    #[error("Skip interval must be greater than zero")]
    ZeroSkipInterval,

    #[error("Skip interval of {secs}s is too long (max {max}s)")]
    SkipIntervalTooLong { secs: u64, max: u64 },

    #[error("No skip interval configured (set skip_interval_secs or pass --interval)")]
    MissingSkipInterval,

    #[error("Poll interval must be between 1 and 60000 ms")]
    InvalidPollInterval,

    #[error("Event buffer must hold at least one event")]
    InvalidEventBuffer,

    #[error("No Spotify access token (set spotify.access_token or SPOTIFY_ACCESS_TOKEN)")]
    MissingAccessToken,

    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Transient failures talking to the playback service.
#[derive(Error, Debug)]
pub enum SourceError {
    #[cfg(feature = "spotify")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Playback service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode playback state: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Playback service unavailable: {0}")]
    Unavailable(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
