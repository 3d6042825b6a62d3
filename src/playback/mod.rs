// Playback state as seen from the outside
// Whatever service is actually playing music plugs in through PlaybackSource

#[cfg(test)]
pub mod testing;

use crate::error::SourceResult;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Opaque identifier of the item that is currently loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One polled reading of the playback state. Superseded by the next poll.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub item_id: Option<ItemId>,
    pub is_playing: bool,
    pub progress: Duration,
    /// Display name, only used in log lines
    pub title: Option<String>,
}

impl PlaybackSnapshot {
    /// Nothing loaded on any device.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn playing(item_id: impl Into<String>) -> Self {
        Self {
            item_id: Some(ItemId::new(item_id)),
            is_playing: true,
            ..Self::default()
        }
    }

    pub fn paused(item_id: impl Into<String>) -> Self {
        Self {
            is_playing: false,
            ..Self::playing(item_id)
        }
    }

    pub fn with_progress(mut self, progress: Duration) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn has_item(&self) -> bool {
        self.item_id.is_some()
    }

    /// Title if we have one, otherwise the raw id
    pub fn label(&self) -> String {
        match (&self.title, &self.item_id) {
            (Some(title), _) => title.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "<nothing>".to_string(),
        }
    }
}

/// The media-control service the monitor watches and drives.
///
/// Both calls may fail transiently; callers log and carry on.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn fetch_current_playback(&self) -> SourceResult<PlaybackSnapshot>;

    async fn skip_to_next(&self) -> SourceResult<()>;
}

#[async_trait]
impl<S: PlaybackSource + ?Sized> PlaybackSource for std::sync::Arc<S> {
    async fn fetch_current_playback(&self) -> SourceResult<PlaybackSnapshot> {
        (**self).fetch_current_playback().await
    }

    async fn skip_to_next(&self) -> SourceResult<()> {
        (**self).skip_to_next().await
    }
}
