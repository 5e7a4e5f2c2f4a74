use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use recall_engine::config::Config;
use recall_engine::logging;
use recall_engine::replay::{load_records, Replayer};

/// Replay recorded review events through the baseline scheduler and print
/// the resulting item states as JSON.
#[derive(Debug, Parser)]
#[command(name = "recall-replay", version)]
struct Args {
    /// JSON array of `{ "itemId": ..., "event": { ... } }` records
    input: PathBuf,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.logging);
    let args = Args::parse();

    let records = match load_records(&args.input) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "failed to load replay input");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(records = records.len(), input = %args.input.display(), "replaying reviews");

    let mut replayer = Replayer::new(config.scheduler.clone(), config.history_limit);
    let report = match replayer.run(&records).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "replay aborted");
            return ExitCode::FAILURE;
        }
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match rendered {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to render report");
            ExitCode::FAILURE
        }
    }
}
