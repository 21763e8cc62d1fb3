//! End-to-end run: fetch → parse → normalize per series, then align →
//! export per group, then commit every output at once.
//!
//! Each phase completes for all inputs before the next begins. Any error
//! aborts the run, and a failed commit restores the previous outputs, so
//! either every group is written or none is.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::analysis::{align, normalize, parse};
use crate::catalog::{Catalog, Group};
use crate::config::Settings;
use crate::export::{StagedFile, TabularSheet, commit, render_json, render_workbook, to_json_records, to_tabular};
use crate::ingest::ObservationSource;
use crate::logging::log_series_failure;
use crate::model::{AlignedTable, MonthlySeries, PipelineError};

/// Where a run writes its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub xlsx_path: PathBuf,
    pub json_dir: PathBuf,
}

impl From<&Settings> for OutputPaths {
    fn from(settings: &Settings) -> Self {
        Self {
            xlsx_path: settings.xlsx_path.clone(),
            json_dir: settings.json_dir.clone(),
        }
    }
}

impl OutputPaths {
    pub fn json_path(&self, group: &str) -> PathBuf {
        self.json_dir.join(format!("{}.json", group))
    }
}

/// One group fully rendered in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedGroup {
    pub name: String,
    pub table: AlignedTable,
    pub sheet: TabularSheet,
    pub json: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub series_fetched: usize,
    /// `(group, row count)` in catalog order.
    pub groups: Vec<(String, usize)>,
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Phase 1: per-series
// ---------------------------------------------------------------------------

/// Fetches, parses and normalizes every catalog series, keyed by friendly
/// name.
pub fn collect_series(
    source: &dyn ObservationSource,
    catalog: &Catalog,
    start: NaiveDate,
) -> Result<HashMap<String, MonthlySeries>, PipelineError> {
    let mut collected = HashMap::with_capacity(catalog.series.len());

    for entry in &catalog.series {
        info!(series_id = %entry.series_id, name = %entry.friendly_name, "downloading");

        let raw = source.fetch(&entry.series_id, start).inspect_err(|e| {
            log_series_failure(&entry.series_id, "fetch", e);
        })?;
        let observations = parse(&raw).inspect_err(|e| {
            log_series_failure(&entry.series_id, "parse", e);
        })?;
        let monthly = normalize(&observations, entry.aggregation);

        debug!(
            series_id = %entry.series_id,
            observations = observations.len(),
            months = monthly.len(),
            policy = ?entry.aggregation,
            "normalized"
        );
        collected.insert(entry.friendly_name.clone(), monthly);
    }

    Ok(collected)
}

// ---------------------------------------------------------------------------
// Phase 2: per-group
// ---------------------------------------------------------------------------

pub fn render_group(
    group: &Group,
    series: &HashMap<String, MonthlySeries>,
) -> Result<RenderedGroup, PipelineError> {
    let table = align(&group.columns, series)?;
    let sheet = to_tabular(&table);
    let json = render_json(&to_json_records(&table)?)?;
    Ok(RenderedGroup {
        name: group.name.clone(),
        table,
        sheet,
        json,
    })
}

pub fn render_groups(
    catalog: &Catalog,
    series: &HashMap<String, MonthlySeries>,
) -> Result<Vec<RenderedGroup>, PipelineError> {
    catalog
        .groups
        .iter()
        .map(|group| render_group(group, series))
        .collect()
}

// ---------------------------------------------------------------------------
// Phase 3: outputs
// ---------------------------------------------------------------------------

/// Turns rendered groups into files: the workbook first, then one JSON
/// document per group.
pub fn stage_outputs(
    rendered: &[RenderedGroup],
    paths: &OutputPaths,
) -> Result<Vec<StagedFile>, PipelineError> {
    let sheets: Vec<(String, TabularSheet)> = rendered
        .iter()
        .map(|g| (g.name.clone(), g.sheet.clone()))
        .collect();

    let mut files = vec![StagedFile::new(&paths.xlsx_path, render_workbook(&sheets)?)];
    files.extend(
        rendered
            .iter()
            .map(|g| StagedFile::new(paths.json_path(&g.name), g.json.clone())),
    );
    Ok(files)
}

/// Runs the whole pipeline once.
pub fn run(
    source: &dyn ObservationSource,
    catalog: &Catalog,
    start: NaiveDate,
    paths: &OutputPaths,
) -> Result<RunSummary, PipelineError> {
    catalog.validate()?;

    let series = collect_series(source, catalog, start)?;
    let rendered = render_groups(catalog, &series)?;
    let staged = stage_outputs(&rendered, paths)?;
    let files = commit(staged)?;

    for group in &rendered {
        info!(group = %group.name, rows = group.table.rows().len(), "written");
    }

    Ok(RunSummary {
        series_fetched: series.len(),
        groups: rendered
            .iter()
            .map(|g| (g.name.clone(), g.table.rows().len()))
            .collect(),
        files,
    })
}
