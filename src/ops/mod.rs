// * Operations
// * Logging setup and run statistics

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    init_for, init_tracing, init_tracing_pretty, init_tracing_with_level, RunStats, RunSummary,
};
