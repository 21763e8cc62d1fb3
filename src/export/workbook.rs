//! xlsx rendering: one worksheet per group, in catalog order.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::tabular::TabularSheet;
use crate::model::PipelineError;

/// Renders named sheets into an in-memory xlsx file.
///
/// Missing cells are left blank. Nothing touches the file system here; the
/// bytes are committed together with the JSON documents.
pub fn render_workbook(sheets: &[(String, TabularSheet)]) -> Result<Vec<u8>, PipelineError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for (name, sheet) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name.as_str())?;

        for (col, title) in sheet.header.iter().enumerate() {
            worksheet.write_string_with_format(0, column_index(col)?, title.as_str(), &bold)?;
        }

        for (idx, row) in sheet.rows.iter().enumerate() {
            let r = row_index(idx + 1)?;
            worksheet.write_string(r, 0, row.date.as_str())?;
            for (col, cell) in row.cells.iter().enumerate() {
                if let Some(value) = cell {
                    worksheet.write_number(r, column_index(col + 1)?, *value)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn row_index(idx: usize) -> Result<u32, XlsxError> {
    u32::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

fn column_index(idx: usize) -> Result<u16, XlsxError> {
    u16::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tabular::TabularRow;

    fn sheet() -> TabularSheet {
        TabularSheet {
            header: vec!["date".to_string(), "A".to_string()],
            rows: vec![
                TabularRow { date: "2024-01-01".to_string(), cells: vec![Some(1.0)] },
                TabularRow { date: "2024-02-01".to_string(), cells: vec![None] },
            ],
        }
    }

    #[test]
    fn test_workbook_bytes_are_a_zip_container() {
        let bytes = render_workbook(&[("Labor".to_string(), sheet())]).unwrap();
        // xlsx files are zip archives: local file header magic "PK\x03\x04".
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_invalid_sheet_name_is_an_error() {
        // Excel forbids '[' ']' ':' '*' '?' '/' '\' in sheet names.
        let result = render_workbook(&[("Bad/Name".to_string(), sheet())]);
        assert!(matches!(result, Err(PipelineError::Workbook(_))));
    }

    #[test]
    fn test_duplicate_sheet_names_are_an_error() {
        let result = render_workbook(&[
            ("Rates".to_string(), sheet()),
            ("Rates".to_string(), sheet()),
        ]);
        assert!(result.is_err());
    }
}
