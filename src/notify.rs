/// Notification dispatch seam.
///
/// The engine decides WHEN to notify; it never builds message bodies or
/// talks to a delivery channel. It hands a structured context to a
/// `NotificationDispatcher`, and the email subsystem (outside this crate)
/// owns templates and transport. A log-only dispatcher is provided for
/// development and for running the daemon without a mail backend.

use std::fmt;

use crate::logging::{self, Subsystem};

/// Structured context handed to the dispatcher. The dispatcher formats this
/// however its channel needs; the engine supplies facts only.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContext {
    /// Observed probability that triggered the notification.
    pub value: i32,
    /// The alert's configured threshold, for "you asked for >= N" copy.
    pub threshold: i32,
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable label for the coordinate, e.g. "Fairbanks, AK".
    /// Falls back to formatted coordinates when resolution fails.
    pub location_label: String,
}

/// A notification send failure. The engine logs it and leaves notification
/// state untouched so the same condition can re-fire next cycle.
#[derive(Debug)]
pub struct DispatchError(pub String);

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatch failed: {}", self.0)
    }
}

impl std::error::Error for DispatchError {}

/// Capability consumed by the evaluation cycle. Implemented outside this
/// crate by the real delivery channel.
pub trait NotificationDispatcher {
    /// Send one notification to one recipient. Must be synchronous from the
    /// engine's point of view: returning Ok means the channel accepted it.
    fn dispatch(&self, recipient_user_id: i64, context: &NotificationContext)
        -> Result<(), DispatchError>;
}

/// Resolves a coordinate to a display label. The real implementation wraps
/// a reverse-geocoding service; the engine caches results per alert.
pub trait PlaceResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> Result<String, String>;
}

/// Fallback label when no resolver is configured or resolution fails.
pub fn coordinate_label(latitude: f64, longitude: f64) -> String {
    format!("{:.2}, {:.2}", latitude, longitude)
}

// ---------------------------------------------------------------------------
// Development dispatcher
// ---------------------------------------------------------------------------

/// Writes notifications to the service log instead of delivering them.
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn dispatch(
        &self,
        recipient_user_id: i64,
        context: &NotificationContext,
    ) -> Result<(), DispatchError> {
        logging::info(
            Subsystem::Notify,
            None,
            &format!(
                "Would notify user {}: probability {} (threshold {}) at {}",
                recipient_user_id, context.value, context.threshold, context.location_label
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_label_formats_to_two_decimals() {
        assert_eq!(coordinate_label(64.8378, -147.7164), "64.84, -147.72");
    }

    #[test]
    fn test_log_dispatcher_always_succeeds() {
        let context = NotificationContext {
            value: 42,
            threshold: 15,
            latitude: 64.84,
            longitude: -147.72,
            location_label: "Fairbanks, AK".to_string(),
        };
        assert!(LogDispatcher.dispatch(10, &context).is_ok());
    }
}
