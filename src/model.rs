//! Core data types for the macro series crawler.
//!
//! This module defines the shared domain model imported by all other modules:
//! cells, observations, monthly series, aligned tables and the crate-wide
//! error type. It contains no I/O.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// FRED encodes a missing observation value as a single dot.
pub const MISSING_SENTINEL: &str = ".";

/// Date format used by the API and by every output encoding.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of the date column / key in every output.
pub const DATE_COLUMN: &str = "date";

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A single value slot: either a number or explicitly missing.
///
/// Missing is distinct from zero and is carried unchanged from parsing
/// through normalization, alignment and export.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    Present(f64),
    #[default]
    Missing,
}

impl Cell {
    pub fn as_option(self) -> Option<f64> {
        match self {
            Cell::Present(v) => Some(v),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Present)
    }
}

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// One `(date, value)` pair exactly as the API returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    pub date: String,
    pub value: String,
}

impl RawPair {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
        }
    }
}

/// A parsed observation at its native frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub value: Cell,
}

/// How a higher-frequency series is collapsed to one value per month.
///
/// A series without a policy is assumed to be monthly already and is only
/// truncated to month start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    Mean,
    Last,
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

/// Returns the first calendar day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPoint {
    pub month_start: NaiveDate,
    pub value: Cell,
}

/// A series at monthly granularity.
///
/// Points are strictly increasing by `month_start` and every `month_start`
/// is the first day of its month. Both are checked on construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlySeries {
    points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    pub fn from_points(points: Vec<MonthlyPoint>) -> Result<Self, PipelineError> {
        Self::check_points(&points)?;
        Ok(Self { points })
    }

    /// Builds a series from points the caller already keyed by month start
    /// in ascending order. Debug builds still check the ordering.
    pub(crate) fn from_sorted_points(points: Vec<MonthlyPoint>) -> Self {
        debug_assert!(
            Self::check_points(&points).is_ok(),
            "monthly points must be month starts in strictly increasing order"
        );
        Self { points }
    }

    fn check_points(points: &[MonthlyPoint]) -> Result<(), PipelineError> {
        for point in points {
            if point.month_start.day() != 1 {
                return Err(PipelineError::InvalidSeries(format!(
                    "{} is not a month start",
                    point.month_start
                )));
            }
        }
        for pair in points.windows(2) {
            if pair[0].month_start >= pair[1].month_start {
                return Err(PipelineError::InvalidSeries(format!(
                    "months out of order: {} then {}",
                    pair[0].month_start, pair[1].month_start
                )));
            }
        }
        Ok(())
    }

    /// Convenience constructor for `(month, value)` tuples.
    pub fn from_values(
        values: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
    ) -> Result<Self, PipelineError> {
        Self::from_points(
            values
                .into_iter()
                .map(|(month_start, value)| MonthlyPoint {
                    month_start,
                    value: value.into(),
                })
                .collect(),
        )
    }

    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value recorded for `month`, or `None` when the series has no point
    /// for that month at all.
    pub fn value_at(&self, month: NaiveDate) -> Option<Cell> {
        self.points
            .binary_search_by_key(&month, |p| p.month_start)
            .ok()
            .map(|idx| self.points[idx].value)
    }
}

// ---------------------------------------------------------------------------
// Aligned tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub month_start: NaiveDate,
    pub cells: Vec<Cell>,
}

/// Several monthly series joined on month start.
///
/// Rows are unique and ascending; `cells[i]` belongs to `columns[i]`.
/// Built once per group and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    columns: Vec<String>,
    rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<AlignedRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.cells.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.month_start).collect()
    }

    /// Looks up one cell. `None` if the month or column is not in the table.
    pub fn cell(&self, month: NaiveDate, column: &str) -> Option<Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        let row = self
            .rows
            .binary_search_by_key(&month, |r| r.month_start)
            .ok()?;
        Some(self.rows[row].cells[col])
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while fetching, transforming or writing series.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No API key is configured; raised before any request is made.
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// Network-level failure talking to the API.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx HTTP response from the API.
    #[error("HTTP error {status} for series {series_id}: {message}")]
    HttpStatus {
        series_id: String,
        status: u16,
        message: String,
    },

    /// An observation date could not be parsed as `YYYY-MM-DD`.
    #[error("malformed date '{input}': {source}")]
    MalformedDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A cell could not be represented in JSON (non-finite number).
    #[error("cannot encode value {value} in column {column} at {month}")]
    UnencodableValue {
        column: String,
        month: NaiveDate,
        value: f64,
    },

    /// A group refers to a friendly name with no series behind it.
    #[error("unknown series: {0}")]
    UnknownSeries(String),

    /// Monthly points violate ordering or month-start rules.
    #[error("invalid monthly series: {0}")]
    InvalidSeries(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A JSON document does not follow the published record layout.
    #[error("invalid JSON document: {0}")]
    InvalidDocument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog parse error: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// An output destination exists but cannot be replaced by a file.
    #[error("cannot write output {}: {reason}", path.display())]
    OutputPath { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
