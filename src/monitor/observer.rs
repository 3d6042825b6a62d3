use super::PlaybackEvent;
use crate::playback::{ItemId, PlaybackSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Last thing we saw, used only for diffing against the next poll.
#[derive(Debug, Default, Clone, PartialEq)]
struct ObservedState {
    item_id: Option<ItemId>,
    is_playing: bool,
}

/// Polls the playback source and turns snapshots into events.
pub struct Observer<S> {
    source: S,
    poll_interval: Duration,
    observed: ObservedState,
    polls: u64,
    poll_failures: u64,
}

impl<S: PlaybackSource> Observer<S> {
    pub fn new(source: S, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
            observed: ObservedState::default(),
            polls: 0,
            poll_failures: 0,
        }
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn poll_failures(&self) -> u64 {
        self.poll_failures
    }

    /// Fetch once and diff against what we saw last time.
    ///
    /// Returns at most one event. A track change wins over a play/pause flip
    /// in the same poll. Fetch errors are logged and leave state untouched.
    pub async fn poll(&mut self) -> Option<PlaybackEvent> {
        self.polls += 1;

        let snapshot = match self.source.fetch_current_playback().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.poll_failures += 1;
                warn!("Failed to fetch playback state: {}", e);
                return None;
            }
        };

        // No item is not the same as paused, keep the old flag
        let Some(item_id) = snapshot.item_id.as_ref() else {
            debug!("No track currently playing");
            return None;
        };

        if self.observed.item_id.as_ref() != Some(item_id) {
            info!(
                "Now playing '{}' ({}) at {:?}",
                snapshot.label(),
                item_id,
                snapshot.progress
            );
            // The scheduler arms on a track change, so remember "playing".
            // A new item that is already paused is reported on the next poll.
            self.observed.item_id = Some(item_id.clone());
            self.observed.is_playing = true;
            return Some(PlaybackEvent::TrackChanged);
        }

        let event = match (self.observed.is_playing, snapshot.is_playing) {
            (false, true) => PlaybackEvent::Resumed,
            (true, false) => PlaybackEvent::Paused,
            _ => return None,
        };
        self.observed.is_playing = snapshot.is_playing;

        debug!("Playback {} on '{}' at {:?}", event, snapshot.label(), snapshot.progress);
        Some(event)
    }

    /// Poll on a fixed cadence until cancelled or the scheduler goes away.
    pub async fn run(&mut self, events: mpsc::Sender<PlaybackEvent>, cancel: CancellationToken) {
        info!("Observer started, polling every {:?}", self.poll_interval);

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                polled = self.poll() => polled,
            };
            let Some(event) = polled else {
                continue;
            };

            // May wait here while the scheduler is busy with a skip
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = events.send(event) => {
                    if sent.is_err() {
                        debug!("Event channel closed, scheduler is gone");
                        break;
                    }
                }
            }
        }

        info!("Observer stopped after {} polls ({} failed)", self.polls, self.poll_failures);
    }
}
