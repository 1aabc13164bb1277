// * Telemetry - JSON Logging and Run Statistics
// * Structured logging for every pipeline stage, plus outcome counters for the run summary

use crate::config::settings::LogFormat;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes JSON tracing at `info`. `RUST_LOG` overrides the filter.
///
/// # Example
/// ```ignore
/// use statement_flow::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(symbol = "TCS", "Processing company");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes JSON tracing with custom log level
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .init();
}

/// Picks the initializer for the configured log format
pub fn init_for(format: LogFormat) {
    match format {
        LogFormat::Json => init_tracing(),
        LogFormat::Pretty => init_tracing_pretty(),
    }
}

/// Outcome counters for one run
#[derive(Debug, Default)]
pub struct RunStats {
    persisted: AtomicU64,
    no_data: AtomicU64,
    fetch_failed: AtomicU64,
    persist_failed: AtomicU64,
    rows_written: AtomicU64,
    ttm_rows_written: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_persisted(&self, rows: u64, ttm_rows: u64) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
        self.ttm_rows_written.fetch_add(ttm_rows, Ordering::Relaxed);
    }

    pub fn record_no_data(&self) {
        self.no_data.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failed(&self) {
        self.fetch_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failed(&self) {
        self.persist_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> RunSummary {
        let persisted = self.persisted.load(Ordering::Relaxed);
        let no_data = self.no_data.load(Ordering::Relaxed);
        let fetch_failed = self.fetch_failed.load(Ordering::Relaxed);
        let persist_failed = self.persist_failed.load(Ordering::Relaxed);

        RunSummary {
            companies: persisted + no_data + fetch_failed + persist_failed,
            persisted,
            no_data,
            fetch_failed,
            persist_failed,
            rows_written: self.rows_written.load(Ordering::Relaxed),
            ttm_rows_written: self.ttm_rows_written.load(Ordering::Relaxed),
        }
    }
}

/// End-of-run summary, logged as a single line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub companies: u64,
    pub persisted: u64,
    pub no_data: u64,
    pub fetch_failed: u64,
    pub persist_failed: u64,
    pub rows_written: u64,
    pub ttm_rows_written: u64,
}

impl RunSummary {
    /// Converts the summary to a JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
