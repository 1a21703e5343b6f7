/// Core data types for the aurora alert evaluation engine.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic, no I/O, and no external dependencies beyond chrono —
/// only types and the bounds they are validated against.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// Cooldown after a notification, in hours. Once it elapses, any reading at
/// or above the alert threshold may notify again regardless of magnitude.
pub const NOTIFY_COOLDOWN_HOURS: i64 = 12;

/// How long observed values are kept in the history table, in hours.
pub const HISTORY_RETENTION_HOURS: i64 = 24;

/// Valid range for an alert's trigger threshold (aurora probability, percent).
pub const THRESHOLD_MIN: i32 = 1;
pub const THRESHOLD_MAX: i32 = 100;

/// Valid range for an alert's increment threshold (minimum rise over the
/// last notified value required to re-notify inside the cooldown).
pub const INCREMENT_MIN: i32 = 1;
pub const INCREMENT_MAX: i32 = 50;

// ---------------------------------------------------------------------------
// Feed types
// ---------------------------------------------------------------------------

/// A single point from the OVATION probability grid.
///
/// Corresponds to one `[longitude, latitude, value]` entry in the
/// `coordinates` array of an SWPC response. Transient: lives only for the
/// evaluation cycle that fetched it and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSample {
    pub longitude: f64,
    pub latitude: f64,
    /// Aurora probability, 0–100. The feed reports integers; kept as i32
    /// so comparisons against alert thresholds are exact.
    pub value: i32,
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// A user-defined monitoring point.
///
/// Created and edited by the CRUD layer; the engine only reads these, and
/// re-reads them every cycle so threshold edits take effect on the next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub user_id: i64,
    /// WGS84 latitude, in [-90, 90].
    pub latitude: f64,
    /// WGS84 longitude, in [-180, 180].
    pub longitude: f64,
    /// Minimum probability at which this alert is eligible to notify.
    pub threshold: i32,
    /// Minimum rise over the last notified value to re-notify before the
    /// cooldown expires.
    pub increment_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The last notification fired for an alert. Absent until the first one.
///
/// Written by the engine immediately after a successful dispatch, and never
/// for a cycle that decided to suppress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationState {
    pub alert_id: i64,
    pub last_value: i32,
    pub last_notified_at: DateTime<Utc>,
}

/// One observed value for one alert in one cycle. Append-only; recorded
/// whether or not the cycle notified.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub alert_id: i64,
    pub value: i32,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing the probability feed.
///
/// Any of these aborts the evaluation cycle that hit it; the next scheduled
/// tick retries from scratch.
#[derive(Debug, PartialEq)]
pub enum FeedError {
    /// The request could not be completed (DNS, connect, timeout).
    RequestFailed(String),
    /// Non-2xx HTTP response from the feed.
    HttpError(u16),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The response parsed but carried no grid samples.
    EmptyGrid,
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::RequestFailed(msg) => write!(f, "Feed request failed: {}", msg),
            FeedError::HttpError(code) => write!(f, "Feed HTTP error: {}", code),
            FeedError::ParseError(msg) => write!(f, "Feed parse error: {}", msg),
            FeedError::EmptyGrid => write!(f, "Feed returned an empty grid"),
        }
    }
}

impl std::error::Error for FeedError {}

impl Alert {
    /// Checks stored bounds. The CRUD layer enforces these at write time;
    /// the engine re-checks on read and skips rows that violate them rather
    /// than evaluating against garbage.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&self.threshold)
            && (INCREMENT_MIN..=INCREMENT_MAX).contains(&self.increment_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert() -> Alert {
        Alert {
            id: 1,
            user_id: 10,
            latitude: 64.84,
            longitude: -147.72,
            threshold: 15,
            increment_threshold: 10,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_valid_alert_passes_bounds_check() {
        assert!(alert().is_valid());
    }

    #[test]
    fn test_out_of_range_latitude_fails_bounds_check() {
        let mut a = alert();
        a.latitude = 91.0;
        assert!(!a.is_valid());
    }

    #[test]
    fn test_out_of_range_threshold_fails_bounds_check() {
        let mut a = alert();
        a.threshold = 0;
        assert!(!a.is_valid(), "threshold below {} should be rejected", THRESHOLD_MIN);
        a.threshold = 101;
        assert!(!a.is_valid(), "threshold above {} should be rejected", THRESHOLD_MAX);
    }

    #[test]
    fn test_boundary_coordinates_are_valid() {
        let mut a = alert();
        a.latitude = -90.0;
        a.longitude = 180.0;
        assert!(a.is_valid());
    }
}
