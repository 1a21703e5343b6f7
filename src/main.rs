/// Daemon entry point for the aurora alert service.
///
/// Wires the configuration, database, feed client, and dispatcher into an
/// evaluation engine, then hands it to the scheduler and parks. Shutdown is
/// process-level (SIGTERM): no multi-step transaction spans the network
/// fetch and the database writes, so a cycle abandoned mid-flight leaves
/// persisted state consistent.

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use auromon_service::config::{Config, DEFAULT_CONFIG_PATH};
use auromon_service::db::{self, PgStore, REQUIRED_TABLES};
use auromon_service::engine::EvaluationEngine;
use auromon_service::ingest::ovation::OvationSource;
use auromon_service::logging::{self, LogLevel, Subsystem};
use auromon_service::notify::LogDispatcher;
use auromon_service::scheduler::Scheduler;

fn main() {
    if let Err(e) = run() {
        eprintln!("auromon_service failed to start: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    logging::init_logger(
        LogLevel::from_config(&config.logging.min_level),
        config.logging.log_file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(
        Subsystem::System,
        None,
        &format!("Starting with config from {}", config_path),
    );

    let client = db::connect_and_verify(REQUIRED_TABLES)?;
    let store = PgStore::new(client);

    let http = reqwest::blocking::Client::builder()
        .user_agent(concat!("auromon_service/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let source = OvationSource::new(
        http,
        config.feed.url.clone(),
        Duration::from_secs(config.feed.timeout_secs),
    );

    // Real delivery is owned by the email subsystem; until it registers a
    // dispatcher this daemon logs what it would have sent.
    let engine = EvaluationEngine::new(
        source,
        store,
        LogDispatcher,
        None,
        chrono::Duration::seconds(config.geocode.label_cache_ttl_secs as i64),
    );
    let engine = Arc::new(Mutex::new(engine));

    let eval_engine = Arc::clone(&engine);
    let prune_engine = Arc::clone(&engine);
    let _scheduler = Scheduler::start(
        Duration::from_secs(config.scheduler.evaluation_interval_secs),
        Duration::from_secs(config.scheduler.prune_interval_secs),
        move || {
            eval_engine.lock().unwrap().run();
        },
        move || {
            prune_engine.lock().unwrap().prune();
        },
    );

    // Park until the process is killed; the tickers own all the work, and
    // the scheduler's Drop joins them if this frame ever unwinds.
    loop {
        std::thread::park();
    }
}
