//! Monthly normalization.
//!
//! Collapses a parsed series to one point per calendar month:
//!
//! | policy   | month value                                        |
//! |----------|----------------------------------------------------|
//! | none     | latest observation in the month, missing or not    |
//! | `Last`   | latest non-missing observation, else missing       |
//! | `Mean`   | mean of non-missing observations, else missing     |
//!
//! Months without any observation are not emitted; gaps are filled only
//! when series are aligned.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{AggregationPolicy, Cell, MonthlyPoint, MonthlySeries, RawObservation, month_start};

pub fn normalize(observations: &[RawObservation], policy: Option<AggregationPolicy>) -> MonthlySeries {
    // Stable sort: same-day observations keep their input order, so "latest"
    // is well defined even for duplicate dates.
    let mut ordered = observations.to_vec();
    ordered.sort_by_key(|obs| obs.date);

    let mut months: BTreeMap<NaiveDate, Vec<Cell>> = BTreeMap::new();
    for obs in &ordered {
        months.entry(month_start(obs.date)).or_default().push(obs.value);
    }

    let points = months
        .into_iter()
        .map(|(month, cells)| MonthlyPoint {
            month_start: month,
            value: collapse(&cells, policy),
        })
        .collect();

    // BTreeMap keys are unique, ascending month starts.
    MonthlySeries::from_sorted_points(points)
}

/// Collapses one month's chronologically ordered cells.
fn collapse(cells: &[Cell], policy: Option<AggregationPolicy>) -> Cell {
    match policy {
        None => cells.last().copied().unwrap_or(Cell::Missing),
        Some(AggregationPolicy::Last) => cells
            .iter()
            .rev()
            .find(|c| !c.is_missing())
            .copied()
            .unwrap_or(Cell::Missing),
        Some(AggregationPolicy::Mean) => {
            let present: Vec<f64> = cells.iter().filter_map(|c| c.as_option()).collect();
            if present.is_empty() {
                Cell::Missing
            } else {
                Cell::Present(present.iter().sum::<f64>() / present.len() as f64)
            }
        }
    }
}
