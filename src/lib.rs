//! Aurora alert evaluation service.
//!
//! Polls the NOAA SWPC OVATION probability grid on a fixed interval,
//! matches each user alert to its nearest grid sample, and dispatches
//! deduplicated notifications. See the module docs for the division of
//! labor; the short version:
//!
//! - `ingest`    — feed client (one fetch per cycle)
//! - `spatial`   — nearest-sample matching
//! - `alert`     — the notify/suppress policy
//! - `db`        — alert, state, and history persistence
//! - `engine`    — the per-cycle orchestration
//! - `scheduler` — the fixed-interval timers
//! - `notify`    — dispatch and place-label seams
//! - `cache`     — TTL cache for place labels
//! - `config`    — TOML configuration
//! - `logging`   — structured daemon logging

pub mod alert;
pub mod cache;
pub mod config;
pub mod db;
pub mod engine;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod notify;
pub mod scheduler;
pub mod spatial;
