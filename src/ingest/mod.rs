//! Data retrieval.
//!
//! `ObservationSource` is the seam between the pipeline and the network:
//! the pipeline only ever asks for raw `(date, value)` pairs, so tests and
//! verification tooling can substitute an in-memory source.

pub mod fred;

use chrono::NaiveDate;

use crate::model::{PipelineError, RawPair};

pub trait ObservationSource {
    /// Returns raw observations for `series_id` from `start` onward.
    fn fetch(&self, series_id: &str, start: NaiveDate) -> Result<Vec<RawPair>, PipelineError>;
}
