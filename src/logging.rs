//! Structured logging for the crawler.
//!
//! Installs a `tracing` subscriber writing to the console and, optionally,
//! appending to a log file for scheduled runs. Verbosity follows `RUST_LOG`
//! and defaults to `info`.
//!
//! Also provides failure classification so fetch problems are logged at a
//! severity that reflects whether someone needs to act on them.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

use crate::model::PipelineError;

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global subscriber. Fails if one is already installed or the
/// log file cannot be opened.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), PipelineError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| PipelineError::Config(format!("cannot install logger: {}", e)))
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a series the API has retired
    Expected,
    /// Unexpected failure - configuration problem or API contract change
    Unexpected,
    /// Unknown - possibly transient (network, upstream outage)
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies a failure raised while fetching or parsing one series.
pub fn classify_failure(err: &PipelineError) -> FailureType {
    match err {
        // FRED answers 404 for series that have been discontinued.
        PipelineError::HttpStatus { status: 404, .. } => FailureType::Expected,
        // Bad key, bad series id, rate limiting.
        PipelineError::HttpStatus { status, .. } if (400..500).contains(status) => {
            FailureType::Unexpected
        }
        PipelineError::HttpStatus { .. } | PipelineError::Transport(_) => FailureType::Unknown,
        PipelineError::MissingCredential(_) | PipelineError::MalformedDate { .. } => {
            FailureType::Unexpected
        }
        _ => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Logs a per-series failure with automatic classification.
pub fn log_series_failure(series_id: &str, operation: &str, err: &PipelineError) {
    let failure_type = classify_failure(err);
    match failure_type {
        FailureType::Expected => {
            debug!(series_id, operation, failure = %failure_type, "{}", err)
        }
        FailureType::Unexpected => {
            error!(series_id, operation, failure = %failure_type, "{}", err)
        }
        FailureType::Unknown => {
            warn!(series_id, operation, failure = %failure_type, "{}", err)
        }
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

pub fn log_run_summary(series_fetched: usize, groups_written: usize, files_written: usize) {
    if groups_written == 0 {
        warn!(series = series_fetched, "run complete but no groups are configured");
    } else {
        info!(
            series = series_fetched,
            groups = groups_written,
            files = files_written,
            "run complete"
        );
    }
}

/// Logs a run that aborted. Nothing was written.
pub fn log_run_failure(err: &PipelineError) {
    error!(failure = %classify_failure(err), "run aborted, no outputs written: {}", err);
}
