//! Inventory of snapshot files in a working area
//!
//! Downstream readers look for `{base}_{YYYYMMDD}_{HHMMSS}.json` files per
//! category directory and pick the lexicographically greatest one as the
//! latest. This module implements the same lookup so a run's output can be
//! listed and checked. The `backup/` directory is never scanned.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::app::models::{Category, RunTimestamp};
use crate::constants::files;
use crate::errors::Result;

/// One recognised snapshot file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub base_name: String,
    pub category: Option<Category>,
    pub timestamp: RunTimestamp,
}

impl SnapshotFile {
    /// Parse `{base}_{date}_{time}.json`; anything else is not a snapshot
    pub fn parse(path: &Path, category: Option<Category>) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let stem = file_name.strip_suffix(&format!(".{}", files::OUTPUT_EXTENSION))?;

        let mut parts = stem.rsplitn(3, '_');
        let time = parts.next()?;
        let date = parts.next()?;
        let base = parts.next()?;

        let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
        if base.is_empty() || !digits(date, 8) || !digits(time, 6) {
            return None;
        }

        Some(Self {
            path: path.to_path_buf(),
            base_name: base.to_string(),
            category,
            timestamp: RunTimestamp::new(format!("{}_{}", date, time)),
        })
    }
}

/// Snapshot files of the current generation, grouped by category
///
/// The `None` key holds files written directly to the working root.
#[derive(Debug, Default, Clone)]
pub struct Inventory {
    groups: BTreeMap<Option<Category>, Vec<SnapshotFile>>,
}

impl Inventory {
    /// Scan `root` and its category directories
    ///
    /// A missing working area yields an empty inventory. Unknown directories
    /// and non-snapshot files are ignored.
    pub async fn scan(root: &Path) -> Result<Self> {
        let mut inventory = Self::default();
        if !fs::try_exists(root).await? {
            return Ok(inventory);
        }

        inventory.scan_dir(root, None).await?;

        let mut entries = fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == files::BACKUP_DIR_NAME {
                continue;
            }
            match name.parse::<Category>() {
                Ok(category) => inventory.scan_dir(&entry.path(), Some(category)).await?,
                Err(_) => debug!("Ignoring unknown directory {}", entry.path().display()),
            }
        }

        for files in inventory.groups.values_mut() {
            files.sort_by(|a, b| {
                (&a.base_name, &a.timestamp).cmp(&(&b.base_name, &b.timestamp))
            });
        }
        Ok(inventory)
    }

    async fn scan_dir(&mut self, dir: &Path, category: Option<Category>) -> Result<()> {
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(file) = SnapshotFile::parse(&entry.path(), category) {
                self.groups.entry(category).or_default().push(file);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of snapshot files
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Categories that hold at least one file (`None` for the root)
    pub fn categories(&self) -> impl Iterator<Item = Option<Category>> + '_ {
        self.groups.keys().copied()
    }

    /// All files of one category, sorted by base name then timestamp
    pub fn files(&self, category: Option<Category>) -> &[SnapshotFile] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct base names within a category
    pub fn base_names(&self, category: Option<Category>) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .files(category)
            .iter()
            .map(|f| f.base_name.as_str())
            .collect();
        names.into_iter().collect()
    }

    /// Latest file for `base_name` in `category`
    pub fn latest(&self, base_name: &str, category: Option<Category>) -> Option<&SnapshotFile> {
        self.files(category)
            .iter()
            .filter(|f| f.base_name == base_name)
            .max_by(|a, b| a.path.file_name().cmp(&b.path.file_name()))
    }

    /// Distinct run timestamps across all files, oldest first
    pub fn generation_timestamps(&self) -> Vec<RunTimestamp> {
        let stamps: BTreeSet<&RunTimestamp> = self
            .groups
            .values()
            .flatten()
            .map(|f| &f.timestamp)
            .collect();
        stamps.into_iter().cloned().collect()
    }
}

/// Latest snapshot path for `base_name` below `root`
pub async fn latest_file(
    root: &Path,
    base_name: &str,
    category: Option<Category>,
) -> Result<Option<PathBuf>> {
    let inventory = Inventory::scan(root).await?;
    Ok(inventory
        .latest(base_name, category)
        .map(|f| f.path.clone()))
}

/// Distinct run timestamps present below `root`
pub async fn generation_timestamps(root: &Path) -> Result<Vec<RunTimestamp>> {
    Ok(Inventory::scan(root).await?.generation_timestamps())
}
