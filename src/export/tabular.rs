//! Spreadsheet-shaped view of aligned tables.
//!
//! Feeds the workbook writer: dates become `YYYY-MM-DD` strings and missing
//! cells become `None`, which the writer leaves blank.

use crate::model::{AlignedTable, DATE_COLUMN, DATE_FORMAT};

/// Spreadsheet-shaped view of an aligned table.
///
/// `header` is `[date, col1, col2, ...]`; each row carries the formatted
/// date plus one optional number per column (`None` = empty cell).
#[derive(Debug, Clone, PartialEq)]
pub struct TabularSheet {
    pub header: Vec<String>,
    pub rows: Vec<TabularRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabularRow {
    pub date: String,
    pub cells: Vec<Option<f64>>,
}

pub fn to_tabular(table: &AlignedTable) -> TabularSheet {
    let header = std::iter::once(DATE_COLUMN.to_string())
        .chain(table.columns().iter().cloned())
        .collect();

    let rows = table
        .rows()
        .iter()
        .map(|row| TabularRow {
            date: row.month_start.format(DATE_FORMAT).to_string(),
            cells: row.cells.iter().map(|c| c.as_option()).collect(),
        })
        .collect();

    TabularSheet { header, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::align;
    use crate::model::MonthlySeries;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_header_and_iso_dates() {
        let mut series = HashMap::new();
        series.insert(
            "UNRATE".to_string(),
            MonthlySeries::from_values([(ymd(2023, 11, 1), Some(3.7)), (ymd(2023, 12, 1), None)])
                .unwrap(),
        );
        let table = align(&["UNRATE".to_string()], &series).unwrap();
        let sheet = to_tabular(&table);

        assert_eq!(sheet.header, vec!["date", "UNRATE"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].date, "2023-11-01");
        assert_eq!(sheet.rows[0].cells, vec![Some(3.7)]);
        assert_eq!(sheet.rows[1].date, "2023-12-01");
        assert_eq!(sheet.rows[1].cells, vec![None]);
    }
}
