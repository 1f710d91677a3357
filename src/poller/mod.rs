//! Remote-artifact poller
//!
//! Repeatedly asks a source for the latest artifact and keeps the most recent
//! successful value. Each cycle is one fetch followed by a fixed delay:
//!
//! - `Success` replaces the current artifact and notifies the observer
//! - `Empty` and `Failure` leave it untouched, silently
//! - the next cycle is always scheduled, with no backoff or retry limit
//!
//! At most one fetch is in flight per poller, including across
//! `stop()`/`start()` restarts. Pausing or stopping never interrupts a fetch
//! that has already been issued; its result is discarded instead.

pub mod gate;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::models::{ArtifactReference, FetchOutcome};

pub use gate::{ApprovalGate, ApprovalResolver};

/// Which endpoint a poller asks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollTarget {
    /// Pending approval image
    Image,
    /// Newest entry of the captured frames list
    Frames,
    /// Latest processed frame, cache-busted
    Stream,
}

/// Something that can answer "what is the latest artifact?"
pub trait ArtifactSource: Send + Sync + 'static {
    fn fetch(&self, target: PollTarget) -> impl Future<Output = FetchOutcome> + Send;
}

/// Snapshot of a poller, owned by one screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollState {
    pub current: Option<ArtifactReference>,
    pub paused: bool,
    /// A fetch is in flight
    pub pending: bool,
    /// A success is waiting for a decision (approval gate only)
    pub held: bool,
}

pub type Observer = Box<dyn Fn(&ArtifactReference) + Send + Sync>;

struct Shared<S> {
    source: S,
    state: Mutex<PollState>,
    observer: Mutex<Option<Observer>>,
    in_flight: tokio::sync::Mutex<()>,
    hold_on_success: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: ArtifactSource> Shared<S> {
    fn is_idle(&self) -> bool {
        let state = lock(&self.state);
        state.paused || state.held
    }

    fn set_pending(&self, pending: bool) {
        lock(&self.state).pending = pending;
    }

    fn apply(&self, target: PollTarget, outcome: FetchOutcome) {
        let update = {
            let mut state = lock(&self.state);
            state.pending = false;
            if state.paused {
                tracing::debug!(?target, "Paused during fetch, discarding result");
                return;
            }
            match outcome {
                FetchOutcome::Success(locator) => {
                    let artifact = ArtifactReference::new(locator);
                    state.current = Some(artifact.clone());
                    if self.hold_on_success {
                        state.held = true;
                    }
                    artifact
                }
                FetchOutcome::Empty => {
                    tracing::debug!(?target, "Nothing available yet");
                    return;
                }
                FetchOutcome::Failure(reason) => {
                    tracing::warn!(?target, %reason, "Poll failed, retrying next cycle");
                    return;
                }
            }
        };

        tracing::debug!(?target, locator = %update.locator, "New artifact");
        if let Some(observer) = lock(&self.observer).as_ref() {
            observer(&update);
        }
    }
}

struct Run {
    stop_tx: watch::Sender<bool>,
    // per run, so a wake sent while stopped never reaches the next run
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Fixed-interval poller bound to one source
pub struct Poller<S: ArtifactSource> {
    shared: Arc<Shared<S>>,
    run: Mutex<Option<Run>>,
}

impl<S: ArtifactSource> Poller<S> {
    pub fn new(source: S) -> Self {
        Self::build(source, false)
    }

    /// A poller that stops fetching after each success until `release`
    fn with_hold(source: S) -> Self {
        Self::build(source, true)
    }

    fn build(source: S, hold_on_success: bool) -> Self {
        Poller {
            shared: Arc::new(Shared {
                source,
                state: Mutex::new(PollState::default()),
                observer: Mutex::new(None),
                in_flight: tokio::sync::Mutex::new(()),
                hold_on_success,
            }),
            run: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// Begin polling `target`. Does nothing if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, target: PollTarget, interval: Duration) {
        let mut run = lock(&self.run);
        if run.as_ref().map_or(false, |r| !r.handle.is_finished()) {
            tracing::debug!(?target, "Poller already running");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let wake = Arc::new(Notify::new());
        let handle = tokio::spawn(poll_loop(
            self.shared.clone(),
            target,
            interval,
            stop_rx,
            wake.clone(),
        ));
        *run = Some(Run {
            stop_tx,
            wake,
            handle,
        });
    }

    /// Cancel future cycles. Safe to call when already stopped.
    pub fn stop(&self) {
        if let Some(run) = lock(&self.run).take() {
            let _ = run.stop_tx.send(true);
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.run)
            .as_ref()
            .map_or(false, |r| !r.handle.is_finished())
    }

    /// Register the single observer, replacing any previous one
    pub fn on_update<F>(&self, observer: F)
    where
        F: Fn(&ArtifactReference) + Send + Sync + 'static,
    {
        *lock(&self.shared.observer) = Some(Box::new(observer));
    }

    pub fn pause(&self) {
        lock(&self.shared.state).paused = true;
        self.wake();
    }

    pub fn resume(&self) {
        lock(&self.shared.state).paused = false;
        self.wake();
    }

    pub fn current(&self) -> Option<ArtifactReference> {
        lock(&self.shared.state).current.clone()
    }

    pub fn state(&self) -> PollState {
        lock(&self.shared.state).clone()
    }

    /// Clear the held artifact and fetch again right away
    fn release(&self) {
        {
            let mut state = lock(&self.shared.state);
            state.current = None;
            state.held = false;
        }
        self.wake();
    }

    /// Cut the current delay short. A stopped poller has nothing to wake;
    /// its next start fetches immediately anyway.
    fn wake(&self) {
        if let Some(run) = lock(&self.run).as_ref() {
            run.wake.notify_one();
        }
    }
}

impl<S: ArtifactSource> Drop for Poller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<S: ArtifactSource>(
    shared: Arc<Shared<S>>,
    target: PollTarget,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    wake: Arc<Notify>,
) {
    tracing::info!(?target, interval_ms = interval.as_millis() as u64, "Poller started");

    loop {
        if *stop_rx.borrow() {
            break;
        }

        if !shared.is_idle() {
            let outcome = {
                // a fetch from a previous run may still be settling
                let _permit = shared.in_flight.lock().await;
                if *stop_rx.borrow() {
                    break;
                }
                shared.set_pending(true);
                shared.source.fetch(target).await
            };

            if *stop_rx.borrow() {
                shared.set_pending(false);
                tracing::debug!(?target, "Stopped during fetch, discarding result");
                break;
            }
            shared.apply(target, outcome);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = wake.notified() => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!(?target, "Poller stopped");
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;
    use tokio::time::sleep;

    fn ok(url: &str) -> FetchOutcome {
        FetchOutcome::Success(url.to_string())
    }

    fn recorder<S: ArtifactSource>(poller: &Poller<S>) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        poller.on_update(move |a| lock(&sink).push(a.locator.clone()));
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn test_notified_once_after_empty_responses() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Empty,
            FetchOutcome::Empty,
            FetchOutcome::Empty,
            ok("http://x/a.jpg"),
        ]);
        let poller = Poller::new(source.clone());
        let seen = recorder(&poller);

        poller.start(PollTarget::Image, Duration::from_secs(5));
        sleep(Duration::from_secs(31)).await;

        assert_eq!(*lock(&seen), vec!["http://x/a.jpg".to_string()]);
        assert_eq!(poller.current().unwrap().locator, "http://x/a.jpg");
        assert!(source.fetches() >= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_tracks_latest_success() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Failure("boom".into()),
            ok("a"),
            FetchOutcome::Empty,
            FetchOutcome::Failure("connection refused".into()),
            ok("b"),
            FetchOutcome::Failure("500".into()),
        ]);
        let poller = Poller::new(source.clone());
        let seen = recorder(&poller);

        poller.start(PollTarget::Frames, Duration::from_secs(1));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(poller.current(), None);

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(poller.current().unwrap().locator, "a");

        sleep(Duration::from_secs(10)).await;
        assert_eq!(poller.current().unwrap().locator, "b");
        assert_eq!(*lock(&seen), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_schedule() {
        let source = ScriptedSource::new(vec![FetchOutcome::Failure("network down".into())]);
        let poller = Poller::new(source.clone());
        poller.start(PollTarget::Image, Duration::from_secs(2));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches(), 1);
        assert_eq!(poller.current(), None);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_issues_no_fetches_until_restart() {
        let source = ScriptedSource::new(vec![]);
        let poller = Poller::new(source.clone());
        poller.start(PollTarget::Stream, Duration::from_secs(1));
        sleep(Duration::from_millis(2500)).await;
        assert_eq!(source.fetches(), 3);

        poller.stop();
        poller.stop();
        sleep(Duration::from_secs(20)).await;
        assert_eq!(source.fetches(), 3);
        assert!(!poller.is_running());

        poller.start(PollTarget::Stream, Duration::from_secs(1));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let source = ScriptedSource::new(vec![]);
        let poller = Poller::new(source.clone());
        poller.start(PollTarget::Image, Duration::from_secs(1));
        poller.start(PollTarget::Image, Duration::from_secs(1));
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(source.fetches(), 2);
        assert_eq!(source.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_server_never_overlaps() {
        let source = ScriptedSource::with_delay(vec![], Duration::from_secs(3));
        let poller = Poller::new(source.clone());
        poller.start(PollTarget::Stream, Duration::from_millis(100));
        sleep(Duration::from_secs(1)).await;
        assert!(poller.state().pending);

        // restart while the first fetch is still running
        poller.stop();
        poller.start(PollTarget::Stream, Duration::from_millis(100));
        sleep(Duration::from_secs(20)).await;

        assert_eq!(source.max_in_flight(), 1);
        assert!(source.fetches() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_discards_in_flight_result() {
        let source = ScriptedSource::with_delay(vec![ok("a"), ok("b")], Duration::from_secs(2));
        let poller = Poller::new(source.clone());
        let seen = recorder(&poller);
        poller.start(PollTarget::Image, Duration::from_secs(1));

        sleep(Duration::from_millis(500)).await;
        poller.pause();
        sleep(Duration::from_secs(10)).await;

        assert!(lock(&seen).is_empty());
        assert_eq!(poller.current(), None);
        assert_eq!(source.fetches(), 1);
        assert!(poller.state().paused);

        poller.resume();
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(poller.current().unwrap().locator, "b");
        assert_eq!(*lock(&seen), vec!["b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_is_replaced() {
        let source = ScriptedSource::new(vec![ok("a"), ok("b")]);
        let poller = Poller::new(source.clone());
        let first = recorder(&poller);
        let second = recorder(&poller);

        poller.start(PollTarget::Image, Duration::from_secs(1));
        sleep(Duration::from_millis(1500)).await;

        assert!(lock(&first).is_empty());
        assert_eq!(*lock(&second), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_while_stopped_does_not_leak_into_next_run() {
        let source = ScriptedSource::new(vec![]);
        let poller = Poller::new(source.clone());
        poller.pause();
        poller.resume();

        poller.start(PollTarget::Image, Duration::from_secs(5));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.fetches(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let source = ScriptedSource::new(vec![]);
        {
            let poller = Poller::new(source.clone());
            poller.start(PollTarget::Image, Duration::from_secs(1));
            sleep(Duration::from_millis(10)).await;
        }
        let n = source.fetches();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(source.fetches(), n);
    }
}
