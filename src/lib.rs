// autoskip - listens along with whatever is playing and skips to the next
// track once you've heard enough of it

pub mod config;   // settings and validation
pub mod error;    // config and playback-service errors
pub mod monitor;  // observer + scheduler, the actual skip loop
pub mod playback; // snapshots and the PlaybackSource seam
#[cfg(feature = "spotify")]
pub mod spotify;  // Spotify Web API source

// Export the stuff other modules actually use
pub use config::{Config, Settings, SkipInterval};
pub use error::{ConfigError, SourceError};
pub use monitor::{Monitor, MonitorReport, PlaybackEvent};
pub use playback::{ItemId, PlaybackSnapshot, PlaybackSource};
