//! Output encodings for aligned tables.
//!
//! - `tabular` - rows of formatted dates and optional numbers (spreadsheet shape).
//! - `json` - the public per-group JSON document with explicit nulls.
//! - `workbook` - one xlsx sheet per group.
//! - `staging` - all-or-nothing commit of rendered files.

pub mod json;
pub mod staging;
pub mod tabular;
pub mod workbook;

pub use json::{JsonRecord, parse_json_document, render_json, to_json_records};
pub use staging::{StagedFile, commit};
pub use tabular::{TabularSheet, to_tabular};
pub use workbook::render_workbook;
