/// Notification deduplication policy.
///
/// Decides, for one alert in one evaluation cycle, whether the observed
/// probability should produce a notification or be suppressed as a duplicate
/// of an earlier one. Pure: no I/O, no clock reads — the caller supplies
/// `now`, so every branch is reachable from a deterministic test.
///
/// Per alert this is a two-state machine. An alert with no recorded
/// notification state is unnotified; the first qualifying observation always
/// fires, regardless of the increment threshold. Once notified, an alert
/// stays notified forever and re-fires only when the cooldown has elapsed or
/// the value has risen by at least the increment threshold since the last
/// notification. The two escape hatches are independent; either suffices.

use chrono::{DateTime, Duration, Utc};

use crate::model::{NotificationState, NOTIFY_COOLDOWN_HOURS};

/// Outcome of evaluating one alert against one observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Notify,
    Suppress,
}

/// Applies the deduplication policy.
///
/// Ordering of the checks matters: the threshold gate comes first and is
/// absolute — a value below the alert's threshold never notifies, whatever
/// the prior state says. Cooldown expiry uses `>=`, so a notification
/// exactly `NOTIFY_COOLDOWN_HOURS` old no longer suppresses.
pub fn decide(
    current_value: i32,
    threshold: i32,
    increment_threshold: i32,
    prior: Option<&NotificationState>,
    now: DateTime<Utc>,
) -> Decision {
    if current_value < threshold {
        return Decision::Suppress;
    }

    let prior = match prior {
        // Never notified before: first qualifying observation fires.
        None => return Decision::Notify,
        Some(state) => state,
    };

    let expired = now - prior.last_notified_at >= Duration::hours(NOTIFY_COOLDOWN_HOURS);
    let increase = current_value - prior.last_value;

    if expired || increase >= increment_threshold {
        Decision::Notify
    } else {
        Decision::Suppress
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
