/// Database access for alert definitions, notification state, and history.
///
/// Connection parameters come from the `DATABASE_URL` environment variable
/// (loaded from `.env` by the binary). The schema is owned by the CRUD side
/// of the application; this module verifies at connect time that the tables
/// it needs exist, so a missing migration fails loudly at startup instead of
/// surfacing as per-cycle query errors at 3am.
///
/// The store traits are the seam between the evaluation engine and postgres:
/// the engine is generic over them, and the test suite substitutes in-memory
/// implementations.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};
use std::fmt;

use crate::model::{Alert, NotificationState};

/// Tables this service reads or writes. Checked by `connect_and_verify`.
pub const REQUIRED_TABLES: &[&str] = &["alerts", "alert_notification_state", "alert_history"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A persistence failure. Carried as text because the engine only ever logs
/// these — nothing upstream branches on the variant of a database error.
#[derive(Debug)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<postgres::Error> for StoreError {
    fn from(e: postgres::Error) -> Self {
        StoreError(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Read/write operations on alert definitions and notification state.
pub trait AlertStore {
    /// All alerts with their notification state, if any. Re-queried every
    /// cycle so edits from the CRUD layer take effect on the next tick.
    fn list_active(&mut self) -> Result<Vec<(Alert, Option<NotificationState>)>, StoreError>;

    /// Upserts the notification state for an alert. Atomic insert-or-update
    /// keyed by alert id — never read-modify-write, so a concurrent CRUD
    /// edit to the same alert cannot produce a lost update.
    fn record_notification(
        &mut self,
        alert_id: i64,
        value: i32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Append and prune operations on per-alert observation history.
pub trait HistoryStore {
    /// Unconditional insert; one row per alert per cycle, no dedup.
    fn append(&mut self, alert_id: i64, value: i32, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Deletes records older than `cutoff`; returns the count removed.
    /// The count is for logging only — a failed prune is retried on the
    /// next scheduled pass, never escalated.
    fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Connects using `DATABASE_URL` and verifies the required tables exist.
pub fn connect_and_verify(required_tables: &[&str]) -> Result<Client, Box<dyn std::error::Error>> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL is not set; add it to .env or the environment")?;

    let mut client = Client::connect(&url, NoTls)?;

    for table in required_tables {
        let row = client.query_one(
            "SELECT EXISTS (
                 SELECT 1 FROM information_schema.tables
                 WHERE table_schema = 'public' AND table_name = $1::text
             )",
            &[table],
        )?;
        let exists: bool = row.get(0);
        if !exists {
            return Err(format!(
                "Required table '{}' is missing — apply sql/001_alerting_schema.sql",
                table
            )
            .into());
        }
    }

    Ok(client)
}

// ---------------------------------------------------------------------------
// Postgres-backed store
// ---------------------------------------------------------------------------

/// The production store: both traits over one postgres connection.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AlertStore for PgStore {
    fn list_active(&mut self) -> Result<Vec<(Alert, Option<NotificationState>)>, StoreError> {
        let rows = self.client.query(
            "SELECT a.id, a.user_id, a.latitude, a.longitude,
                    a.threshold, a.increment_threshold,
                    a.created_at, a.updated_at,
                    s.last_value, s.last_notified_at
             FROM alerts a
             LEFT JOIN alert_notification_state s ON s.alert_id = a.id
             ORDER BY a.id",
            &[],
        )?;

        let mut alerts = Vec::with_capacity(rows.len());
        for row in rows {
            let alert = Alert {
                id: row.get(0),
                user_id: row.get(1),
                latitude: row.get(2),
                longitude: row.get(3),
                threshold: row.get(4),
                increment_threshold: row.get(5),
                created_at: row.get(6),
                updated_at: row.get(7),
            };

            let last_value: Option<i32> = row.get(8);
            let last_notified_at: Option<DateTime<Utc>> = row.get(9);
            let state = match (last_value, last_notified_at) {
                (Some(value), Some(at)) => Some(NotificationState {
                    alert_id: alert.id,
                    last_value: value,
                    last_notified_at: at,
                }),
                _ => None,
            };

            alerts.push((alert, state));
        }

        Ok(alerts)
    }

    fn record_notification(
        &mut self,
        alert_id: i64,
        value: i32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.client.execute(
            "INSERT INTO alert_notification_state (alert_id, last_value, last_notified_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (alert_id) DO UPDATE
             SET last_value = EXCLUDED.last_value,
                 last_notified_at = EXCLUDED.last_notified_at",
            &[&alert_id, &value, &at],
        )?;
        Ok(())
    }
}

impl HistoryStore for PgStore {
    fn append(&mut self, alert_id: i64, value: i32, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.client.execute(
            "INSERT INTO alert_history (alert_id, value, recorded_at)
             VALUES ($1, $2, $3)",
            &[&alert_id, &value, &at],
        )?;
        Ok(())
    }

    fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let deleted = self.client.execute(
            "DELETE FROM alert_history WHERE recorded_at < $1",
            &[&cutoff],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_carries_cause() {
        let err = StoreError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_required_tables_cover_engine_schema() {
        assert!(REQUIRED_TABLES.contains(&"alerts"));
        assert!(REQUIRED_TABLES.contains(&"alert_notification_state"));
        assert!(REQUIRED_TABLES.contains(&"alert_history"));
    }
}
