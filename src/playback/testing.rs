// In-memory playback source for driving the monitor in tests

use super::{PlaybackSnapshot, PlaybackSource};
use crate::error::{SourceError, SourceResult};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct ScriptState {
    current: PlaybackSnapshot,
    failing_fetches: usize,
    failing_skips: usize,
    hang: bool,
    skips: Vec<Instant>,
    skip_attempts: usize,
    fetches: usize,
}

/// Test double whose "now playing" state is set directly by the test.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    state: Mutex<ScriptState>,
}

impl ScriptedSource {
    pub fn new(initial: PlaybackSnapshot) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                current: initial,
                ..ScriptState::default()
            }),
        }
    }

    pub fn set(&self, snapshot: PlaybackSnapshot) {
        self.state.lock().unwrap().current = snapshot;
    }

    /// Next `count` fetches return an error
    pub fn fail_fetches(&self, count: usize) {
        self.state.lock().unwrap().failing_fetches = count;
    }

    /// Next `count` skips return an error
    pub fn fail_skips(&self, count: usize) {
        self.state.lock().unwrap().failing_skips = count;
    }

    /// Every later fetch and skip never completes, like a stuck request
    pub fn hang(&self) {
        self.state.lock().unwrap().hang = true;
    }

    /// Instants of successful skips
    pub fn skips(&self) -> Vec<Instant> {
        self.state.lock().unwrap().skips.clone()
    }

    pub fn skip_attempts(&self) -> usize {
        self.state.lock().unwrap().skip_attempts
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    // Guard is dropped before the caller awaits
    fn record_and_check_hang(&self, record: impl FnOnce(&mut ScriptState)) -> bool {
        let mut state = self.state.lock().unwrap();
        record(&mut state);
        state.hang
    }
}

#[async_trait]
impl PlaybackSource for ScriptedSource {
    async fn fetch_current_playback(&self) -> SourceResult<PlaybackSnapshot> {
        if self.record_and_check_hang(|state| state.fetches += 1) {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(SourceError::Unavailable("scripted fetch failure".to_string()));
        }
        Ok(state.current.clone())
    }

    async fn skip_to_next(&self) -> SourceResult<()> {
        if self.record_and_check_hang(|state| state.skip_attempts += 1) {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.failing_skips > 0 {
            state.failing_skips -= 1;
            return Err(SourceError::Unavailable("scripted skip failure".to_string()));
        }
        state.skips.push(Instant::now());
        Ok(())
    }
}
