//! Multi-series alignment on month start.
//!
//! Outer join: the row set is the union of every input month, and a series
//! with no point for a row contributes `Cell::Missing`. Column order comes
//! from the caller (the group definition), never from map iteration order.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::model::{AlignedRow, AlignedTable, Cell, MonthlySeries, PipelineError};

pub fn align(
    columns: &[String],
    series: &HashMap<String, MonthlySeries>,
) -> Result<AlignedTable, PipelineError> {
    let selected = columns
        .iter()
        .map(|name| {
            series
                .get(name)
                .ok_or_else(|| PipelineError::UnknownSeries(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let months: BTreeSet<NaiveDate> = selected
        .iter()
        .flat_map(|s| s.points().iter().map(|p| p.month_start))
        .collect();

    let rows = months
        .into_iter()
        .map(|month| AlignedRow {
            month_start: month,
            cells: selected
                .iter()
                .map(|s| s.value_at(month).unwrap_or(Cell::Missing))
                .collect(),
        })
        .collect();

    Ok(AlignedTable::new(columns.to_vec(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> HashMap<String, MonthlySeries> {
        let mut map = HashMap::new();
        map.insert(
            "A".to_string(),
            MonthlySeries::from_values([(ymd(2024, 1, 1), Some(3.0)), (ymd(2024, 3, 1), Some(5.0))])
                .unwrap(),
        );
        map.insert(
            "B".to_string(),
            MonthlySeries::from_values([(ymd(2024, 2, 1), Some(7.0))]).unwrap(),
        );
        map
    }

    #[test]
    fn test_outer_alignment_of_two_monthly_series() {
        let table = align(&cols(&["A", "B"]), &sample()).unwrap();
        assert_eq!(
            table.months(),
            vec![ymd(2024, 1, 1), ymd(2024, 2, 1), ymd(2024, 3, 1)]
        );
        assert_eq!(table.cell(ymd(2024, 2, 1), "A"), Some(Cell::Missing));
        assert_eq!(table.cell(ymd(2024, 2, 1), "B"), Some(Cell::Present(7.0)));
        assert_eq!(table.cell(ymd(2024, 1, 1), "A"), Some(Cell::Present(3.0)));
        assert_eq!(table.cell(ymd(2024, 3, 1), "B"), Some(Cell::Missing));
    }

    #[test]
    fn test_column_order_follows_declaration() {
        let table = align(&cols(&["B", "A"]), &sample()).unwrap();
        assert_eq!(table.columns(), &["B".to_string(), "A".to_string()]);
        assert_eq!(table.rows()[1].cells, vec![Cell::Present(7.0), Cell::Missing]);
    }

    #[test]
    fn test_recorded_missing_and_absent_render_the_same() {
        let mut map = sample();
        map.insert(
            "C".to_string(),
            MonthlySeries::from_values([(ymd(2024, 1, 1), None)]).unwrap(),
        );
        let table = align(&cols(&["C"]), &map).unwrap();
        assert_eq!(table.months(), vec![ymd(2024, 1, 1)], "a missing-valued month still yields a row");
        assert_eq!(table.cell(ymd(2024, 1, 1), "C"), Some(Cell::Missing));
    }

    #[test]
    fn test_only_selected_columns_contribute_rows() {
        let table = align(&cols(&["B"]), &sample()).unwrap();
        assert_eq!(table.months(), vec![ymd(2024, 2, 1)]);
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let err = align(&cols(&["A", "Z"]), &sample()).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownSeries(name) if name == "Z"));
    }

    #[test]
    fn test_empty_series_yields_no_rows() {
        let mut map = HashMap::new();
        map.insert("E".to_string(), MonthlySeries::default());
        let table = align(&cols(&["E"]), &map).unwrap();
        assert!(table.rows().is_empty());
        assert_eq!(table.columns().len(), 1);
    }
}
