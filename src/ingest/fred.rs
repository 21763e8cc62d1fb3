//! FRED (Federal Reserve Economic Data) API client.
//!
//! Retrieves series observations from the St. Louis Fed observations
//! endpoint. Values come back as strings, with `"."` standing in for a
//! missing observation; they are passed through untouched for the parser.
//!
//! API documentation: https://fred.stlouisfed.org/docs/api/fred/series_observations.html

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::ObservationSource;
use crate::model::{DATE_FORMAT, PipelineError, RawPair};

pub const FRED_OBSERVATIONS_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "FRED_API_KEY";

/// Series the API rejects an `observation_start` for; they are requested
/// in full.
pub const SERIES_WITHOUT_START_FILTER: &[&str] = &["NAPM", "NAPMPI"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// FRED API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FredObservationsResponse {
    #[serde(default)]
    pub observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
pub struct FredObservation {
    pub date: String,
    pub value: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct FredErrorResponse {
    error_message: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

pub struct FredClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    /// Builds a client. Fails before any request if `api_key` is blank.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, PipelineError> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::MissingCredential(API_KEY_VAR));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            base_url: base_url.to_string(),
        })
    }

    /// Query parameters for one observations request.
    pub fn query_params(&self, series_id: &str, start: NaiveDate) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("series_id", series_id.to_string()),
            ("api_key", self.api_key.clone()),
            ("file_type", "json".to_string()),
        ];
        if !SERIES_WITHOUT_START_FILTER.contains(&series_id) {
            params.push(("observation_start", start.format(DATE_FORMAT).to_string()));
        }
        params
    }
}

impl ObservationSource for FredClient {
    fn fetch(&self, series_id: &str, start: NaiveDate) -> Result<Vec<RawPair>, PipelineError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query_params(series_id, start))
            .header("Accept", "application/json")
            .send()?;

        debug!(url = %redact_api_key(response.url().as_str(), &self.api_key), "requested");

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PipelineError::HttpStatus {
                series_id: series_id.to_string(),
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            });
        }

        let body: FredObservationsResponse = response.json()?;
        Ok(body
            .observations
            .into_iter()
            .map(|o| RawPair::new(o.date, o.value))
            .collect())
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<FredErrorResponse>(body)
        .ok()
        .and_then(|e| e.error_message)
}

/// Replaces the API key in a logged URL.
pub fn redact_api_key(url: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        url.to_string()
    } else {
        url.replace(api_key, "REDACTED")
    }
}

// ============================================================================
// Tests
// ============================================================================
