use statement_flow::config::Settings;
use statement_flow::engine::pipeline;
use statement_flow::ops::telemetry;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            // * Logging is not up yet; the format itself comes from settings
            eprintln!("statement-flow: {}", e);
            return ExitCode::FAILURE;
        }
    };

    telemetry::init_for(settings.log_format);
    info!(
        roster = %settings.roster_path.display(),
        table = %settings.table,
        base_url = %settings.base_url,
        login = settings.credentials.is_some(),
        "Statement-Flow starting"
    );

    match pipeline::run(&settings).await {
        Ok(summary) => {
            info!(summary = %summary.to_json(), "Statement-Flow finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
