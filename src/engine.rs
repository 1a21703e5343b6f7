/// The evaluation cycle: one scheduled pass over every alert.
///
/// Each cycle fetches the probability grid once, then walks the alerts:
/// resolve the nearest grid sample, append the observed value to history,
/// apply the deduplication policy, and — when the policy says notify —
/// dispatch and record the new notification state. A feed failure aborts
/// the whole cycle; every other failure is isolated to the alert that hit
/// it, so one bad row or one bounced email never starves its siblings.
///
/// Clock injection follows the same pattern as the dedup policy: `run_at`
/// and `prune_at` take `now` for deterministic tests, and thin wrappers
/// supply the wall clock in production.

use chrono::{DateTime, Duration, Utc};

use crate::alert::dedup::{self, Decision};
use crate::cache::TtlCache;
use crate::db::{AlertStore, HistoryStore, StoreError};
use crate::ingest::GridSource;
use crate::logging::{self, Subsystem};
use crate::model::{Alert, GridSample, HISTORY_RETENTION_HOURS};
use crate::notify::{coordinate_label, NotificationContext, NotificationDispatcher, PlaceResolver};
use crate::spatial;

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// Counters from one evaluation cycle, for the summary log line and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// False when the cycle aborted before touching any alert (feed failure,
    /// empty grid, or a failed alert listing).
    pub completed: bool,
    pub alerts_seen: usize,
    pub notified: usize,
    pub suppressed: usize,
    /// Alerts that errored or could not be matched this cycle.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the collaborators for one evaluation loop. Built once at startup
/// and driven by the scheduler; holds no state of its own between cycles
/// other than the place-label cache.
pub struct EvaluationEngine<G, S, D> {
    source: G,
    store: S,
    dispatcher: D,
    resolver: Option<Box<dyn PlaceResolver + Send>>,
    label_cache: TtlCache<i64, String>,
}

impl<G, S, D> EvaluationEngine<G, S, D>
where
    G: GridSource,
    S: AlertStore + HistoryStore,
    D: NotificationDispatcher,
{
    pub fn new(
        source: G,
        store: S,
        dispatcher: D,
        resolver: Option<Box<dyn PlaceResolver + Send>>,
        label_ttl: Duration,
    ) -> Self {
        Self {
            source,
            store,
            dispatcher,
            resolver,
            label_cache: TtlCache::new(label_ttl),
        }
    }

    /// Runs one evaluation cycle against the wall clock.
    pub fn run(&mut self) -> CycleOutcome {
        self.run_at(Utc::now())
    }

    /// Runs one evaluation cycle as of `now`.
    pub fn run_at(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();

        // One fetch per cycle. Failure here — including an empty grid — is
        // the only thing that aborts the pass: evaluating alerts against
        // missing data would record garbage history and false suppressions.
        let samples = match self.source.fetch() {
            Ok(samples) => samples,
            Err(e) => {
                logging::log_feed_failure("Grid fetch", &e);
                logging::info(Subsystem::System, None, "Cycle aborted, retrying next tick");
                return outcome;
            }
        };

        let alerts = match self.store.list_active() {
            Ok(alerts) => alerts,
            Err(e) => {
                logging::error(Subsystem::Database, None, &format!("Alert listing failed: {}", e));
                return outcome;
            }
        };

        outcome.completed = true;
        outcome.alerts_seen = alerts.len();

        for (alert, prior) in &alerts {
            match self.evaluate_alert(alert, prior.as_ref(), &samples, now) {
                Ok(Decision::Notify) => outcome.notified += 1,
                Ok(Decision::Suppress) => outcome.suppressed += 1,
                Err(()) => outcome.failed += 1,
            }
        }

        logging::log_cycle_summary(
            outcome.alerts_seen,
            outcome.notified,
            outcome.suppressed,
            outcome.failed,
        );
        outcome
    }

    /// Processes a single alert. `Err(())` means this alert is done for the
    /// cycle; the cause has already been logged with the alert id attached.
    fn evaluate_alert(
        &mut self,
        alert: &Alert,
        prior: Option<&crate::model::NotificationState>,
        samples: &[GridSample],
        now: DateTime<Utc>,
    ) -> Result<Decision, ()> {
        if !alert.is_valid() {
            logging::warn(
                Subsystem::System,
                Some(alert.id),
                "Skipping alert with out-of-range fields",
            );
            return Err(());
        }

        let sample = match spatial::nearest(samples, alert.latitude, alert.longitude) {
            Some(sample) => *sample,
            None => {
                // Unreachable with a global feed, but a partial grid must
                // degrade to a skip rather than a false reading.
                logging::warn(
                    Subsystem::System,
                    Some(alert.id),
                    "No grid sample matched this coordinate",
                );
                return Err(());
            }
        };

        // History is recorded whatever the decision turns out to be, and a
        // failed append does not block the decision: history is best-effort
        // observability, the notification is the product.
        if let Err(e) = HistoryStore::append(&mut self.store, alert.id, sample.value, now) {
            logging::warn(
                Subsystem::Database,
                Some(alert.id),
                &format!("History append failed: {}", e),
            );
        }

        let decision = dedup::decide(
            sample.value,
            alert.threshold,
            alert.increment_threshold,
            prior,
            now,
        );

        if decision == Decision::Suppress {
            logging::debug(
                Subsystem::System,
                Some(alert.id),
                &format!("Suppressed at value {}", sample.value),
            );
            return Ok(Decision::Suppress);
        }

        let context = NotificationContext {
            value: sample.value,
            threshold: alert.threshold,
            latitude: alert.latitude,
            longitude: alert.longitude,
            location_label: self.location_label(alert, now),
        };

        if let Err(e) = self.dispatcher.dispatch(alert.user_id, &context) {
            // State stays untouched so the same condition re-fires next
            // cycle: at-least-once, never silently dropped.
            logging::error(Subsystem::Notify, Some(alert.id), &e.to_string());
            return Err(());
        }

        if let Err(e) = self.store.record_notification(alert.id, sample.value, now) {
            // The notification went out but the state write failed; the
            // next cycle may duplicate it. Accepted tradeoff.
            logging::error(
                Subsystem::Database,
                Some(alert.id),
                &format!("Notification state update failed: {}", e),
            );
        }

        logging::info(
            Subsystem::Notify,
            Some(alert.id),
            &format!("Notified user {} at value {}", alert.user_id, sample.value),
        );
        Ok(Decision::Notify)
    }

    /// Resolves the display label for an alert's coordinate, through the
    /// TTL cache. Resolution problems fall back to formatted coordinates
    /// and never affect the notify decision.
    fn location_label(&mut self, alert: &Alert, now: DateTime<Utc>) -> String {
        let resolver = match self.resolver.as_ref() {
            Some(resolver) => resolver,
            None => return coordinate_label(alert.latitude, alert.longitude),
        };

        match self.label_cache.get_or_fetch(alert.id, now, || {
            resolver.resolve(alert.latitude, alert.longitude)
        }) {
            Ok(label) => label,
            Err(e) => {
                logging::debug(
                    Subsystem::Geo,
                    Some(alert.id),
                    &format!("Place lookup failed, using coordinates: {}", e),
                );
                coordinate_label(alert.latitude, alert.longitude)
            }
        }
    }

    /// Deletes history older than the retention window as of `now`.
    pub fn prune_at(&mut self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let cutoff = now - Duration::hours(HISTORY_RETENTION_HOURS);
        match self.store.prune_older_than(cutoff) {
            Ok(deleted) => {
                logging::info(
                    Subsystem::Database,
                    None,
                    &format!("Pruned {} history records older than {}", deleted, cutoff),
                );
                Ok(deleted)
            }
            Err(e) => {
                logging::warn(
                    Subsystem::Database,
                    None,
                    &format!("History prune failed, will retry next pass: {}", e),
                );
                Err(e)
            }
        }
    }

    /// Prunes against the wall clock.
    pub fn prune(&mut self) {
        let _ = self.prune_at(Utc::now());
    }
}
