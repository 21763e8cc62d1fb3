//! Runtime settings.
//!
//! Read once at startup from the process environment, after loading a `.env`
//! file if one is present. Only the API key is required, and only for runs
//! that actually fetch.

use std::path::PathBuf;

use chrono::{Months, NaiveDate};

use crate::catalog::Catalog;
use crate::ingest::fred::{API_KEY_VAR, FRED_OBSERVATIONS_URL};
use crate::model::PipelineError;

pub const DEFAULT_YEARS_BACK: u32 = 10;
pub const DEFAULT_XLSX_PATH: &str = "data/FRED_macro_last10y.xlsx";
pub const DEFAULT_JSON_DIR: &str = "macro-dashboard/public/data";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Empty when unset; the FRED client refuses to start without one.
    pub api_key: String,
    pub base_url: String,
    pub years_back: u32,
    pub xlsx_path: PathBuf,
    pub json_dir: PathBuf,
    /// TOML catalog overriding the built-in registry.
    pub catalog_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: FRED_OBSERVATIONS_URL.to_string(),
            years_back: DEFAULT_YEARS_BACK,
            xlsx_path: PathBuf::from(DEFAULT_XLSX_PATH),
            json_dir: PathBuf::from(DEFAULT_JSON_DIR),
            catalog_path: None,
            log_file: None,
        }
    }
}

impl Settings {
    /// Loads `.env` (if any) and reads settings from the environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let years_back = match get("MACROMON_YEARS_BACK") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                PipelineError::Config(format!("MACROMON_YEARS_BACK='{}': {}", raw, e))
            })?,
            None => defaults.years_back,
        };

        Ok(Settings {
            api_key: get(API_KEY_VAR).unwrap_or_default(),
            base_url: get("FRED_BASE_URL").unwrap_or(defaults.base_url),
            years_back,
            xlsx_path: get("MACROMON_XLSX_PATH").map(PathBuf::from).unwrap_or(defaults.xlsx_path),
            json_dir: get("MACROMON_JSON_DIR").map(PathBuf::from).unwrap_or(defaults.json_dir),
            catalog_path: get("MACROMON_CATALOG").map(PathBuf::from),
            log_file: get("MACROMON_LOG_FILE").map(PathBuf::from),
        })
    }

    /// The configured catalog file, or the built-in registry.
    pub fn load_catalog(&self) -> Result<Catalog, PipelineError> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }

    /// First date requested from the API: `years_back` years before `today`.
    pub fn start_date(&self, today: NaiveDate) -> Result<NaiveDate, PipelineError> {
        start_date(today, self.years_back)
    }
}

/// `today` minus whole calendar years; Feb 29 clamps to Feb 28.
pub fn start_date(today: NaiveDate, years_back: u32) -> Result<NaiveDate, PipelineError> {
    years_back
        .checked_mul(12)
        .and_then(|months| today.checked_sub_months(Months::new(months)))
        .ok_or_else(|| PipelineError::Config(format!("cannot go back {} years from {}", years_back, today)))
}
