use super::PlaybackEvent;
use crate::config::SkipInterval;
use crate::playback::PlaybackSource;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Single-shot alarm. Either stopped or armed with exactly one deadline.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CountdownTimer {
    deadline: Option<Instant>,
}

impl CountdownTimer {
    /// Arm (or re-arm) for `interval` from now, replacing any pending deadline.
    pub fn arm(&mut self, interval: SkipInterval) {
        self.deadline = Some(Instant::now() + interval.as_duration());
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Owns the countdown and fires the skip action when it runs out.
pub struct Scheduler<S> {
    source: S,
    interval: SkipInterval,
    timer: CountdownTimer,
    events_handled: u64,
    skips_fired: u64,
    skip_failures: u64,
}

impl<S: PlaybackSource> Scheduler<S> {
    pub fn new(source: S, interval: SkipInterval) -> Self {
        Self {
            source,
            interval,
            timer: CountdownTimer::default(),
            events_handled: 0,
            skips_fired: 0,
            skip_failures: 0,
        }
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn events_handled(&self) -> u64 {
        self.events_handled
    }

    /// Skip attempts, including ones the service rejected
    pub fn skips_fired(&self) -> u64 {
        self.skips_fired
    }

    pub fn skip_failures(&self) -> u64 {
        self.skip_failures
    }

    pub fn handle_event(&mut self, event: PlaybackEvent) {
        self.events_handled += 1;

        match event {
            // A new track or a resume always gets the full interval
            PlaybackEvent::TrackChanged | PlaybackEvent::Resumed => {
                self.timer.arm(self.interval);
                debug!("{}: countdown armed for {}", event, self.interval);
            }
            // Elapsed time is dropped, resume starts over
            PlaybackEvent::Paused => {
                self.timer.disarm();
                debug!("{}: countdown stopped", event);
            }
        }
    }

    /// Countdown ran out: skip, then start the next full interval.
    ///
    /// A failed skip leaves the timer re-armed like a successful one.
    pub async fn on_expired(&mut self) {
        self.timer.arm(self.interval);
        self.skips_fired += 1;

        match self.source.skip_to_next().await {
            Ok(()) => info!("Listened for {}, skipped to next track", self.interval),
            Err(e) => {
                self.skip_failures += 1;
                warn!("Failed to skip to next track: {}", e);
            }
        }
    }

    /// Handle events and expiries one at a time until cancelled or the
    /// observer goes away. Events win over an expiry that is due at the same instant.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PlaybackEvent>, cancel: CancellationToken) {
        info!("Scheduler started, skipping every {}", self.interval);

        loop {
            let deadline = self.timer.deadline();
            let expiry = async move {
                match deadline {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        debug!("Event channel closed, observer is gone");
                        break;
                    }
                },
                _ = expiry => {
                    // Don't hold up shutdown on a slow skip request
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = self.on_expired() => {}
                    }
                }
            }
        }

        self.timer.disarm();
        info!(
            "Scheduler stopped: {} skips ({} failed), {} events handled",
            self.skips_fired, self.skip_failures, self.events_handled
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::ScriptedSource;
    use crate::playback::PlaybackSnapshot;
    use std::sync::Arc;
    use std::time::Duration;

    fn interval() -> SkipInterval {
        SkipInterval::from_secs(5).unwrap()
    }

    fn scheduler(source: &Arc<ScriptedSource>) -> Scheduler<Arc<ScriptedSource>> {
        Scheduler::new(source.clone(), interval())
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_stopped() {
        let source = Arc::new(ScriptedSource::default());
        let scheduler = scheduler(&source);
        assert!(!scheduler.timer().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let source = Arc::new(ScriptedSource::default());
        let mut scheduler = scheduler(&source);
        let start = Instant::now();

        scheduler.handle_event(PlaybackEvent::TrackChanged);
        assert_eq!(scheduler.timer().deadline(), Some(start + Duration::from_secs(5)));

        scheduler.handle_event(PlaybackEvent::Paused);
        assert!(!scheduler.timer().is_running());

        // Pausing twice is harmless
        scheduler.handle_event(PlaybackEvent::Paused);
        assert!(!scheduler.timer().is_running());

        time::advance(Duration::from_secs(2)).await;
        scheduler.handle_event(PlaybackEvent::Resumed);
        assert_eq!(scheduler.timer().deadline(), Some(start + Duration::from_secs(7)));
        assert_eq!(scheduler.events_handled(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_change_rearms_just_before_expiry() {
        let source = Arc::new(ScriptedSource::default());
        let mut scheduler = scheduler(&source);
        let start = Instant::now();

        scheduler.handle_event(PlaybackEvent::TrackChanged);
        time::advance(Duration::from_secs(4)).await;
        scheduler.handle_event(PlaybackEvent::TrackChanged);

        assert_eq!(scheduler.timer().deadline(), Some(start + Duration::from_secs(9)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_skips_and_rearms() {
        let source = Arc::new(ScriptedSource::new(PlaybackSnapshot::playing("a")));
        let mut scheduler = scheduler(&source);
        let start = Instant::now();

        scheduler.on_expired().await;
        assert_eq!(source.skips().len(), 1);
        assert_eq!(scheduler.timer().deadline(), Some(start + Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_skip_keeps_timer_running() {
        let source = Arc::new(ScriptedSource::new(PlaybackSnapshot::playing("a")));
        source.fail_skips(1);
        let mut scheduler = scheduler(&source);

        scheduler.on_expired().await;
        assert!(scheduler.timer().is_running());
        assert_eq!(scheduler.skips_fired(), 1);
        assert_eq!(scheduler.skip_failures(), 1);
        assert!(source.skips().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fires_repeatedly_while_playing() {
        let source = Arc::new(ScriptedSource::new(PlaybackSnapshot::playing("a")));
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let task = {
            let mut scheduler = scheduler(&source);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                scheduler.run(rx, cancel).await;
                scheduler
            })
        };

        tx.send(PlaybackEvent::TrackChanged).await.unwrap();
        time::sleep(Duration::from_millis(16_500)).await;

        let fired: Vec<Duration> = source.skips().iter().map(|at| *at - start).collect();
        assert_eq!(
            fired,
            vec![Duration::from_secs(5), Duration::from_secs(10), Duration::from_secs(15)]
        );

        cancel.cancel();
        let scheduler = task.await.unwrap();
        assert!(!scheduler.timer().is_running());
        assert_eq!(scheduler.skips_fired(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_never_fires_while_stopped() {
        let source = Arc::new(ScriptedSource::new(PlaybackSnapshot::playing("a")));
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = {
            let mut scheduler = scheduler(&source);
            let cancel = cancel.clone();
            tokio::spawn(async move { scheduler.run(rx, cancel).await })
        };

        tx.send(PlaybackEvent::TrackChanged).await.unwrap();
        time::sleep(Duration::from_secs(2)).await;
        tx.send(PlaybackEvent::Paused).await.unwrap();
        time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.skip_attempts(), 0);
        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_a_hanging_skip() {
        let source = Arc::new(ScriptedSource::new(PlaybackSnapshot::playing("a")));
        source.hang();
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = {
            let mut scheduler = scheduler(&source);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                scheduler.run(rx, cancel).await;
                scheduler
            })
        };

        tx.send(PlaybackEvent::TrackChanged).await.unwrap();
        time::sleep(Duration::from_secs(8)).await;
        assert_eq!(source.skip_attempts(), 1);

        cancel.cancel();
        let scheduler = task.await.unwrap();
        assert!(!scheduler.timer().is_running());
        assert!(source.skips().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_when_sender_dropped() {
        let source = Arc::new(ScriptedSource::default());
        let (tx, rx) = mpsc::channel(1);
        tx.send(PlaybackEvent::TrackChanged).await.unwrap();
        drop(tx);

        let mut scheduler = scheduler(&source);
        scheduler.run(rx, CancellationToken::new()).await;
        assert_eq!(scheduler.events_handled(), 1);
        assert!(!scheduler.timer().is_running());
    }
}
