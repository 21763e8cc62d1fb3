//! Per-group JSON documents.
//!
//! The document is a public contract read by the dashboard: an array of
//! objects, each with a `date` key (`YYYY-MM-DD`) followed by one key per
//! column holding a number or `null`. Every column key is present on every
//! row. Non-finite numbers are refused rather than written as `NaN`.

use serde_json::{Map, Number, Value};

use crate::analysis::parse::parse_date;
use crate::model::{AlignedRow, AlignedTable, Cell, DATE_COLUMN, DATE_FORMAT, PipelineError};

/// One row of the JSON document. Keys keep insertion order.
pub type JsonRecord = Map<String, Value>;

pub fn to_json_records(table: &AlignedTable) -> Result<Vec<JsonRecord>, PipelineError> {
    table
        .rows()
        .iter()
        .map(|row| {
            let mut record = JsonRecord::new();
            record.insert(
                DATE_COLUMN.to_string(),
                Value::String(row.month_start.format(DATE_FORMAT).to_string()),
            );
            for (column, cell) in table.columns().iter().zip(&row.cells) {
                record.insert(column.clone(), encode_cell(column, row, *cell)?);
            }
            Ok::<_, PipelineError>(record)
        })
        .collect()
}

fn encode_cell(column: &str, row: &AlignedRow, cell: Cell) -> Result<Value, PipelineError> {
    match cell {
        Cell::Missing => Ok(Value::Null),
        Cell::Present(v) => Number::from_f64(v).map(Value::Number).ok_or_else(|| {
            PipelineError::UnencodableValue {
                column: column.to_string(),
                month: row.month_start,
                value: v,
            }
        }),
    }
}

/// Serializes records as compact UTF-8 JSON.
pub fn render_json(records: &[JsonRecord]) -> Result<String, PipelineError> {
    Ok(serde_json::to_string(records)?)
}

/// Reads a rendered document back into a table with the given columns.
///
/// Fails if a row lacks a column key, carries an unexpected key, holds
/// anything other than a number or `null`, or if dates are not strictly
/// ascending.
pub fn parse_json_document(text: &str, columns: &[String]) -> Result<AlignedTable, PipelineError> {
    let records: Vec<JsonRecord> = serde_json::from_str(text)?;
    let mut rows: Vec<AlignedRow> = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        let date = record
            .get(DATE_COLUMN)
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::InvalidDocument(format!("row {} has no date", idx)))?;
        let month_start = parse_date(date)?;

        if let Some(prev) = rows.last() {
            if prev.month_start >= month_start {
                return Err(PipelineError::InvalidDocument(format!(
                    "row {} date {} is not after {}",
                    idx, month_start, prev.month_start
                )));
            }
        }
        if record.len() != columns.len() + 1 {
            return Err(PipelineError::InvalidDocument(format!(
                "row {} has {} keys, expected {}",
                idx,
                record.len(),
                columns.len() + 1
            )));
        }

        let cells = columns
            .iter()
            .map(|column| match record.get(column) {
                Some(Value::Null) => Ok(Cell::Missing),
                Some(Value::Number(n)) => n.as_f64().map(Cell::Present).ok_or_else(|| {
                    PipelineError::InvalidDocument(format!("row {} column {} out of range", idx, column))
                }),
                Some(other) => Err(PipelineError::InvalidDocument(format!(
                    "row {} column {} holds {}",
                    idx, column, other
                ))),
                None => Err(PipelineError::InvalidDocument(format!(
                    "row {} is missing column {}",
                    idx, column
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(AlignedRow { month_start, cells });
    }

    Ok(AlignedTable::new(columns.to_vec(), rows))
}
