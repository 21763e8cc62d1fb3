//! Runs the crawler once.
//!
//! Usage:
//!   macromon_service           fetch every series and write all outputs
//!   macromon_service verify    check each catalog series and print a JSON report

use std::process::ExitCode;

use chrono::{Local, Utc};
use tracing::info;

use macromon_service::config::Settings;
use macromon_service::ingest::fred::FredClient;
use macromon_service::logging::{init_logging, log_run_failure, log_run_summary};
use macromon_service::model::PipelineError;
use macromon_service::pipeline::{self, OutputPaths};
use macromon_service::verify::verify_catalog;

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(settings.log_file.as_deref()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let verify_only = std::env::args().nth(1).as_deref() == Some("verify");
    let result = if verify_only {
        verify(&settings)
    } else {
        crawl(&settings)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_run_failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn crawl(settings: &Settings) -> Result<(), PipelineError> {
    let catalog = settings.load_catalog()?;
    catalog.validate()?;
    let client = FredClient::new(&settings.api_key, &settings.base_url)?;
    let start = settings.start_date(Local::now().date_naive())?;
    info!(%start, "fetching from");

    let paths = OutputPaths::from(settings);
    let summary = pipeline::run(&client, &catalog, start, &paths)?;

    log_run_summary(summary.series_fetched, summary.groups.len(), summary.files.len());
    info!(excel = %paths.xlsx_path.display(), json_dir = %paths.json_dir.display(), "done");
    Ok(())
}

fn verify(settings: &Settings) -> Result<(), PipelineError> {
    let catalog = settings.load_catalog()?;
    catalog.validate()?;
    let client = FredClient::new(&settings.api_key, &settings.base_url)?;
    let start = settings.start_date(Local::now().date_naive())?;

    let report = verify_catalog(&client, &catalog, start, Utc::now());
    info!(
        total = report.summary.total,
        working = report.summary.working,
        partial = report.summary.partial,
        failed = report.summary.failed,
        "verification complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
