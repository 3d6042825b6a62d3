// The playback monitor - two tasks joined by one small channel
//
//   Observer --(PlaybackEvent)--> Scheduler --> skip_to_next()
//
// The scheduler is the only thing that touches the countdown.

pub mod events;   // what changed between polls
pub mod observer; // polls the source, diffs snapshots
pub mod scheduler; // owns the countdown, fires skips

pub use events::PlaybackEvent;
pub use observer::Observer;
pub use scheduler::{CountdownTimer, Scheduler};

use crate::config::Settings;
use crate::playback::PlaybackSource;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Counters collected from both tasks once they stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub polls: u64,
    pub poll_failures: u64,
    pub events_handled: u64,
    pub skips_fired: u64,
    pub skip_failures: u64,
}

pub struct Monitor<S> {
    source: Arc<S>,
    settings: Settings,
}

impl<S: PlaybackSource + 'static> Monitor<S> {
    pub fn new(source: Arc<S>, settings: Settings) -> Self {
        Self { source, settings }
    }

    /// Run the observer and scheduler until `cancel` fires, or until either
    /// side stops, then report what happened.
    pub async fn run(self, cancel: CancellationToken) -> Result<MonitorReport> {
        let (event_tx, event_rx) = mpsc::channel(self.settings.event_buffer);

        let mut observer = Observer::new(self.source.clone(), self.settings.poll_interval);
        let mut scheduler = Scheduler::new(self.source.clone(), self.settings.skip_interval);

        info!(
            "Monitor starting: skip every {}, poll every {:?}",
            self.settings.skip_interval, self.settings.poll_interval
        );

        let observer_task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                observer.run(event_tx, cancel).await;
                observer
            })
        };

        let scheduler_task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                scheduler.run(event_rx, cancel).await;
                scheduler
            })
        };

        // If one side exits on its own the other sees a closed channel,
        // but cancelling as well makes sure nothing is left waiting
        let observer = observer_task.await;
        cancel.cancel();
        let scheduler = scheduler_task.await?;
        let observer = observer?;

        let report = MonitorReport {
            polls: observer.polls(),
            poll_failures: observer.poll_failures(),
            events_handled: scheduler.events_handled(),
            skips_fired: scheduler.skips_fired(),
            skip_failures: scheduler.skip_failures(),
        };

        info!("Monitor stopped: {:?}", report);
        Ok(report)
    }
}
