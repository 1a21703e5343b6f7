/// Fixed-interval timers driving the evaluation and prune loops.
///
/// Two independent tickers: evaluation on a 5-minute period and history
/// pruning on a 60-minute period, each running once immediately at startup.
/// A ticker is a single thread, so runs of the same task never overlap —
/// the next wait starts when the previous run finishes. Runs of different
/// tickers may overlap; the shared store serializes on its own locking.
///
/// No implicit global timer registry: tasks are plain closures handed in at
/// start, and tests drive the loop with millisecond periods and counters
/// instead of wall-clock waits.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::logging::{self, Subsystem};

/// One periodic task with an explicit stop lifecycle.
pub struct Ticker {
    name: &'static str,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the task loop: run once now, then once per period until
    /// stopped. The period is measured from the end of one run to the start
    /// of the next, so a slow run delays the following tick instead of
    /// piling up concurrent ones.
    pub fn start(
        name: &'static str,
        period: Duration,
        mut task: impl FnMut() + Send + 'static,
    ) -> Ticker {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                task();
                match stop_rx.recv_timeout(period) {
                    // Stop requested, or the Ticker was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => continue,
                }
            })
            .expect("failed to spawn ticker thread");

        logging::info(
            Subsystem::System,
            None,
            &format!("Started '{}' ticker with period {:?}", name, period),
        );

        Ticker {
            name,
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signals the loop to exit and waits for the in-flight run to finish.
    pub fn stop(&mut self) {
        // Send fails only if the thread already exited; either way, join.
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        logging::info(
            Subsystem::System,
            None,
            &format!("Stopped '{}' ticker", self.name),
        );
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

/// The service's two timers, bundled for startup/shutdown.
pub struct Scheduler {
    evaluation: Ticker,
    prune: Ticker,
}

impl Scheduler {
    /// Starts both timers. The tasks are closures so the scheduler stays
    /// ignorant of the engine's generics; the binary hands in closures over
    /// a shared engine.
    pub fn start(
        evaluation_period: Duration,
        prune_period: Duration,
        evaluation_task: impl FnMut() + Send + 'static,
        prune_task: impl FnMut() + Send + 'static,
    ) -> Scheduler {
        Scheduler {
            evaluation: Ticker::start("evaluation", evaluation_period, evaluation_task),
            prune: Ticker::start("prune", prune_period, prune_task),
        }
    }

    /// Stops both timers, letting in-flight runs complete.
    pub fn stop(&mut self) {
        self.evaluation.stop();
        self.prune.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_ticker_runs_immediately_at_start() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let mut ticker = Ticker::start("test-immediate", Duration::from_secs(3600), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Give the thread a moment; the period is an hour, so any run we
        // observe is the startup run.
        thread::sleep(Duration::from_millis(50));
        ticker.stop();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ticker_runs_repeatedly_on_short_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let mut ticker = Ticker::start("test-repeat", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(100));
        ticker.stop();

        assert!(
            runs.load(Ordering::SeqCst) >= 3,
            "expected several runs in 100ms with a 10ms period, got {}",
            runs.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn test_stop_waits_for_in_flight_run() {
        let finished = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&finished);

        let mut ticker = Ticker::start("test-inflight", Duration::from_secs(3600), move || {
            thread::sleep(Duration::from_millis(80));
            flag.fetch_add(1, Ordering::SeqCst);
        });

        // Stop while the first run is still sleeping; stop() must join it.
        thread::sleep(Duration::from_millis(10));
        ticker.stop();

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scheduler_drives_both_tasks_independently() {
        let eval_runs = Arc::new(AtomicUsize::new(0));
        let prune_runs = Arc::new(AtomicUsize::new(0));
        let eval_counter = Arc::clone(&eval_runs);
        let prune_counter = Arc::clone(&prune_runs);

        let mut scheduler = Scheduler::start(
            Duration::from_millis(10),
            Duration::from_secs(3600),
            move || {
                eval_counter.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                prune_counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        assert!(eval_runs.load(Ordering::SeqCst) >= 3);
        assert_eq!(
            prune_runs.load(Ordering::SeqCst),
            1,
            "prune should only have its startup run inside the test window"
        );
    }
}
