//! Data models for the download catalog
//!
//! A download unit maps one CelesTrak group onto one output file. Units carry an
//! optional [`Category`] which selects the subdirectory of the working area the
//! file lands in; every file of one run shares the same [`RunTimestamp`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::constants::files;
use crate::errors::ConfigError;

/// Semantic grouping of satellite groups; used only as a path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    SpecialInterest,
    Weather,
    Communications,
    Navigation,
    Scientific,
    Miscellaneous,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 6] = [
        Category::SpecialInterest,
        Category::Weather,
        Category::Communications,
        Category::Navigation,
        Category::Scientific,
        Category::Miscellaneous,
    ];

    /// Directory name for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SpecialInterest => "special-interest",
            Category::Weather => "weather",
            Category::Communications => "communications",
            Category::Navigation => "navigation",
            Category::Scientific => "scientific",
            Category::Miscellaneous => "miscellaneous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownCategory {
                name: s.to_string(),
            })
    }
}

/// One entry of the catalog: a provider group written to one output file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadUnit {
    /// CelesTrak group identifier (value of the `GROUP` query parameter)
    pub group_id: String,
    /// Stem of the output file name
    pub output_base_name: String,
    /// Destination subdirectory; `None` places the file at the working root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl DownloadUnit {
    pub fn new(
        group_id: impl Into<String>,
        output_base_name: impl Into<String>,
        category: Option<Category>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            output_base_name: output_base_name.into(),
            category,
        }
    }

    /// Unit whose output file is named after its group
    pub fn categorized(group_id: &str, category: Category) -> Self {
        Self::new(group_id, group_id, Some(category))
    }

    /// Directory the unit's output is written to
    pub fn destination_dir(&self, root: &Path) -> PathBuf {
        match self.category {
            Some(category) => root.join(category.as_str()),
            None => root.to_path_buf(),
        }
    }

    /// `{output_base_name}_{timestamp}.json`
    pub fn output_file_name(&self, timestamp: &RunTimestamp) -> String {
        format!(
            "{}_{}.{}",
            self.output_base_name,
            timestamp,
            files::OUTPUT_EXTENSION
        )
    }

    /// Full output path below `root`
    pub fn output_path(&self, root: &Path, timestamp: &RunTimestamp) -> PathBuf {
        self.destination_dir(root)
            .join(self.output_file_name(timestamp))
    }

    /// Output path relative to the working root, with `/` separators
    pub fn relative_output(&self, timestamp: &RunTimestamp) -> String {
        match self.category {
            Some(category) => format!("{}/{}", category, self.output_file_name(timestamp)),
            None => self.output_file_name(timestamp),
        }
    }
}

impl fmt::Display for DownloadUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(f, "{}/{}", category, self.group_id),
            None => f.write_str(&self.group_id),
        }
    }
}

/// Identifier shared by every file produced in one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunTimestamp(String);

impl RunTimestamp {
    /// Timestamp for a run starting now (local time)
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(at.format(files::TIMESTAMP_FORMAT).to_string())
    }

    /// Use a caller-supplied identifier verbatim
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse back into a date-time when the value uses the standard format
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, files::TIMESTAMP_FORMAT).ok()
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
