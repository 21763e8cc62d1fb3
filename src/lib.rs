//! Monthly macro dashboard data from FRED.
//!
//! Fetches a catalog of economic series, normalizes each to month-start
//! granularity, aligns them into groups and writes an xlsx workbook plus one
//! JSON document per group.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod verify;
