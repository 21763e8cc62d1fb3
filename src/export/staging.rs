//! All-or-nothing file commits.
//!
//! Every output is first written in full to a temporary file next to its
//! destination. Only when all temporaries exist are they renamed into place.
//! Destinations that already exist are moved aside first; if any rename
//! fails, the new files are removed and the originals put back, so a failed
//! commit leaves every destination as it was.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::{debug, error, warn};

use crate::model::PipelineError;

/// A fully rendered output waiting to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// One destination touched by the rename phase.
struct Replacement {
    path: PathBuf,
    /// The previous file, moved aside. Deleted on drop.
    backup: Option<TempPath>,
    persisted: bool,
}

/// Writes every staged file, returning the committed paths in input order.
pub fn commit(files: Vec<StagedFile>) -> Result<Vec<PathBuf>, PipelineError> {
    commit_with(files, |tmp, path| tmp.persist(path).map(|_| ()).map_err(|e| e.error))
}

fn commit_with<F>(files: Vec<StagedFile>, mut persist: F) -> Result<Vec<PathBuf>, PipelineError>
where
    F: FnMut(NamedTempFile, &Path) -> io::Result<()>,
{
    for file in &files {
        check_destination(&file.path)?;
    }

    // Dropping a NamedTempFile deletes it, so an early return here cleans up
    // everything staged so far.
    let mut pending = Vec::with_capacity(files.len());
    for file in &files {
        let dir = parent_dir(&file.path);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&file.bytes)?;
        tmp.as_file().sync_all()?;
        debug!(path = %file.path.display(), bytes = file.bytes.len(), "staged output");
        pending.push((tmp, file.path.clone()));
    }

    let mut journal: Vec<Replacement> = Vec::with_capacity(pending.len());
    for (tmp, path) in pending {
        if let Err(e) = replace(tmp, path, &mut persist, &mut journal) {
            roll_back(journal);
            return Err(e);
        }
    }

    Ok(journal.into_iter().map(|r| r.path).collect())
}

/// Refuses destinations that a file cannot be renamed onto.
fn check_destination(path: &Path) -> Result<(), PipelineError> {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => Err(PipelineError::OutputPath {
            path: path.to_path_buf(),
            reason: "destination exists and is not a regular file".to_string(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn replace<F>(
    tmp: NamedTempFile,
    path: PathBuf,
    persist: &mut F,
    journal: &mut Vec<Replacement>,
) -> Result<(), PipelineError>
where
    F: FnMut(NamedTempFile, &Path) -> io::Result<()>,
{
    let backup = if path.exists() { Some(move_aside(&path)?) } else { None };
    let result = persist(tmp, &path);
    journal.push(Replacement {
        path,
        backup,
        persisted: result.is_ok(),
    });
    Ok(result?)
}

fn move_aside(path: &Path) -> Result<TempPath, PipelineError> {
    let backup = Builder::new()
        .prefix(".macromon-backup")
        .tempfile_in(parent_dir(path))?
        .into_temp_path();
    fs::rename(path, &backup)?;
    Ok(backup)
}

/// Undoes the rename phase, newest first.
fn roll_back(journal: Vec<Replacement>) {
    for entry in journal.into_iter().rev() {
        if entry.persisted {
            if let Err(e) = fs::remove_file(&entry.path) {
                warn!(path = %entry.path.display(), error = %e, "cannot remove new output");
            }
        }
        if let Some(backup) = entry.backup {
            if let Err(e) = backup.persist(&entry.path) {
                // Keep the moved-aside file on disk rather than lose it.
                let kept = e.path.keep().map_err(|k| k.error);
                error!(
                    path = %entry.path.display(),
                    backup = ?kept,
                    error = %e.error,
                    "cannot restore previous output"
                );
            }
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
