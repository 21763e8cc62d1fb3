//! Observation parsing.
//!
//! Dates are strict: a date that does not parse aborts the series. Values
//! are lenient: the sentinel, unexpected tokens and non-finite numbers all
//! become `Cell::Missing` so one bad token does not discard a whole series.

use chrono::NaiveDate;

use crate::model::{Cell, DATE_FORMAT, MISSING_SENTINEL, PipelineError, RawObservation, RawPair};

/// Parses raw API pairs, returning observations sorted by date.
///
/// The sort is stable, so observations sharing a date keep their input
/// order.
pub fn parse(raw: &[RawPair]) -> Result<Vec<RawObservation>, PipelineError> {
    let mut observations = raw
        .iter()
        .map(|pair| {
            Ok::<_, PipelineError>(RawObservation {
                date: parse_date(&pair.date)?,
                value: parse_value(&pair.value),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    observations.sort_by_key(|obs| obs.date);
    Ok(observations)
}

pub fn parse_date(input: &str) -> Result<NaiveDate, PipelineError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|source| {
        PipelineError::MalformedDate {
            input: input.to_string(),
            source,
        }
    })
}

pub fn parse_value(input: &str) -> Cell {
    let trimmed = input.trim();
    if trimmed == MISSING_SENTINEL {
        return Cell::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Present(v),
        _ => Cell::Missing,
    }
}
