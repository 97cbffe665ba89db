//! Generation rotation
//!
//! Before a new generation is fetched, everything currently in the working
//! area is moved into `backup/`, which is emptied first so it only ever holds
//! the previous generation. The only way to obtain a [`RotatedArea`] is
//! [`rotate`], and the orchestrator refuses to run without one.
//!
//! Failing to create or clear the backup directory is fatal. Failing to move
//! an individual entry is not: the entry is reported and the remaining
//! entries are still moved.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::constants::files;
use crate::errors::{RotationError, RotationResult};

/// A pre-existing entry that could not be moved into the backup area
#[derive(Debug, Clone, Serialize)]
pub struct RelocationFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Working area that has just been rotated and is ready for a new generation
#[derive(Debug)]
pub struct RotatedArea {
    root: PathBuf,
    backup: PathBuf,
    relocated: Vec<PathBuf>,
    failures: Vec<RelocationFailure>,
}

impl RotatedArea {
    /// Working area root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backup area now holding the previous generation
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Entries moved into the backup area, by their new path
    pub fn relocated(&self) -> &[PathBuf] {
        &self.relocated
    }

    /// Entries left behind in the working area
    pub fn failures(&self) -> &[RelocationFailure] {
        &self.failures
    }

    /// True when at least one entry could not be relocated
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Move the current generation into `backup/` and leave the working area empty
///
/// # Errors
///
/// Returns `RotationError` if the working area or the backup directory cannot
/// be created, the backup area cannot be cleared, or the working area cannot
/// be listed. Per-entry move failures are reported through
/// [`RotatedArea::failures`] instead.
pub async fn rotate(working_area: &Path) -> RotationResult<RotatedArea> {
    rotate_with(working_area, |from, to| fs::rename(from, to)).await
}

/// [`rotate`] with the per-entry move supplied by the caller
async fn rotate_with<F, Fut>(working_area: &Path, relocate: F) -> RotationResult<RotatedArea>
where
    F: Fn(PathBuf, PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let root = working_area.to_path_buf();
    let backup = root.join(files::BACKUP_DIR_NAME);

    fs::create_dir_all(&root)
        .await
        .map_err(|source| RotationError::WorkingDir {
            path: root.clone(),
            source,
        })?;
    fs::create_dir_all(&backup)
        .await
        .map_err(|source| RotationError::BackupDir {
            path: backup.clone(),
            source,
        })?;

    clear_dir(&backup).await?;

    let mut relocated = Vec::new();
    let mut failures = Vec::new();

    let mut entries = fs::read_dir(&root)
        .await
        .map_err(|source| RotationError::ReadDir {
            path: root.clone(),
            source,
        })?;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(RotationError::ReadDir {
                    path: root.clone(),
                    source,
                })
            }
        };

        let name = entry.file_name();
        if name == files::BACKUP_DIR_NAME {
            continue;
        }

        let from = entry.path();
        let to = backup.join(&name);
        match relocate(from.clone(), to.clone()).await {
            Ok(()) => {
                debug!("Moved {} to {}", from.display(), to.display());
                relocated.push(to);
            }
            Err(e) => {
                warn!("Could not move {} into backup: {}", from.display(), e);
                failures.push(RelocationFailure {
                    path: from,
                    reason: e.to_string(),
                });
            }
        }
    }

    relocated.sort();

    info!(
        "Rotated {} entries into {} ({} failed)",
        relocated.len(),
        backup.display(),
        failures.len()
    );

    Ok(RotatedArea {
        root,
        backup,
        relocated,
        failures,
    })
}

/// Remove everything inside `dir`, keeping `dir` itself
async fn clear_dir(dir: &Path) -> RotationResult<()> {
    let clear_error = |path: &Path, source| RotationError::ClearBackup {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(|e| clear_error(dir, e))?;
    let mut removed = 0usize;

    while let Some(entry) = entries.next_entry().await.map_err(|e| clear_error(dir, e))? {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| clear_error(&path, e))?;

        // Symlinks to directories are removed as links, never followed
        let result = if file_type.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        result.map_err(|e| clear_error(&path, e))?;
        removed += 1;
    }

    if removed > 0 {
        debug!("Cleared {} entries from {}", removed, dir.display());
    }
    Ok(())
}
