//! Catalog Verification Module
//!
//! Checks every configured series against the API and reports which ones
//! are reachable and returning usable data, without writing any outputs.
//! Unlike a normal run, a failing series does not stop the report.
//!
//! Use this before adding new series to the catalog.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{normalize, parse};
use crate::catalog::{Catalog, SeriesEntry};
use crate::ingest::ObservationSource;
use crate::logging::log_series_failure;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub results: Vec<SeriesVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub partial: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesVerification {
    pub friendly_name: String,
    pub series_id: String,
    pub status: VerificationStatus,
    pub observation_count: usize,
    pub missing_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub months: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Observations returned and at least one has a value.
    Success,
    /// Reachable, but no usable values in the window.
    PartialSuccess,
    Failed,
}

// ============================================================================
// Verification
// ============================================================================

pub fn verify_series(
    source: &dyn ObservationSource,
    entry: &SeriesEntry,
    start: NaiveDate,
) -> SeriesVerification {
    let mut result = SeriesVerification {
        friendly_name: entry.friendly_name.clone(),
        series_id: entry.series_id.clone(),
        status: VerificationStatus::Failed,
        observation_count: 0,
        missing_count: 0,
        first_date: None,
        last_date: None,
        months: 0,
        error_message: None,
    };

    let observations = match source.fetch(&entry.series_id, start).and_then(|raw| parse(&raw)) {
        Ok(observations) => observations,
        Err(e) => {
            log_series_failure(&entry.series_id, "verify", &e);
            result.error_message = Some(e.to_string());
            return result;
        }
    };

    result.observation_count = observations.len();
    result.missing_count = observations.iter().filter(|o| o.value.is_missing()).count();
    result.first_date = observations.first().map(|o| o.date);
    result.last_date = observations.last().map(|o| o.date);
    result.months = normalize(&observations, entry.aggregation).len();

    result.status = if result.observation_count > result.missing_count {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };
    result
}

pub fn verify_catalog(
    source: &dyn ObservationSource,
    catalog: &Catalog,
    start: NaiveDate,
    now: DateTime<Utc>,
) -> VerificationReport {
    let results: Vec<SeriesVerification> = catalog
        .series
        .iter()
        .map(|entry| verify_series(source, entry, start))
        .collect();

    let count = |status: VerificationStatus| results.iter().filter(|r| r.status == status).count();
    let summary = VerificationSummary {
        total: results.len(),
        working: count(VerificationStatus::Success),
        partial: count(VerificationStatus::PartialSuccess),
        failed: count(VerificationStatus::Failed),
    };

    VerificationReport {
        timestamp: now.to_rfc3339(),
        results,
        summary,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PipelineError, RawPair};
    use chrono::TimeZone;

    struct MapSource(Vec<(&'static str, Vec<RawPair>)>);

    impl ObservationSource for MapSource {
        fn fetch(&self, series_id: &str, _start: NaiveDate) -> Result<Vec<RawPair>, PipelineError> {
            self.0
                .iter()
                .find(|(id, _)| *id == series_id)
                .map(|(_, raw)| raw.clone())
                .ok_or_else(|| PipelineError::HttpStatus {
                    series_id: series_id.to_string(),
                    status: 404,
                    message: "Not Found".to_string(),
                })
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(name: &str, id: &str) -> SeriesEntry {
        SeriesEntry {
            friendly_name: name.to_string(),
            series_id: id.to_string(),
            aggregation: None,
        }
    }

    #[test]
    fn test_verify_series_counts_observations() {
        let source = MapSource(vec![(
            "UNRATE",
            vec![
                RawPair::new("2024-02-01", "3.9"),
                RawPair::new("2024-01-01", "3.7"),
                RawPair::new("2024-03-01", "."),
            ],
        )]);
        let result = verify_series(&source, &entry("Unemployment_rate", "UNRATE"), ymd(2024, 1, 1));
        assert_eq!(result.status, VerificationStatus::Success);
        assert_eq!(result.observation_count, 3);
        assert_eq!(result.missing_count, 1);
        assert_eq!(result.first_date, Some(ymd(2024, 1, 1)));
        assert_eq!(result.last_date, Some(ymd(2024, 3, 1)));
        assert_eq!(result.months, 3);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_all_missing_series_is_partial() {
        let source = MapSource(vec![("NAPM", vec![RawPair::new("2024-01-01", ".")])]);
        let result = verify_series(&source, &entry("ISM", "NAPM"), ymd(2024, 1, 1));
        assert_eq!(result.status, VerificationStatus::PartialSuccess);
    }

    #[test]
    fn test_report_continues_past_failures() {
        let source = MapSource(vec![
            ("UNRATE", vec![RawPair::new("2024-01-01", "3.7")]),
            ("BAD", vec![RawPair::new("yesterday", "1.0")]),
        ]);
        let catalog = Catalog {
            series: vec![entry("A", "UNRATE"), entry("B", "GONE"), entry("C", "BAD")],
            groups: vec![],
        };
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        let report = verify_catalog(&source, &catalog, ymd(2024, 1, 1), now);

        assert_eq!(
            report.summary,
            VerificationSummary { total: 3, working: 1, partial: 0, failed: 2 }
        );
        assert_eq!(report.timestamp, "2024-05-01T13:00:00+00:00");
        assert!(report.results[1].error_message.as_deref().unwrap().contains("404"));
        assert!(report.results[2].error_message.as_deref().unwrap().contains("yesterday"));
    }
}
