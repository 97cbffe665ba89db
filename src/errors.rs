//! Error types for CelesTrak Fetcher
//!
//! Errors are split by how far they are allowed to travel. Configuration and
//! rotation errors are fatal and propagate up to the caller with `?`. Fetch and
//! write errors belong to a single download unit and never leave the
//! orchestrator: they are folded into the run report instead.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration and catalog errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// I/O error reading or writing a configuration file
    #[error("Configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Category name outside the known set
    #[error("Unknown category: {name}")]
    UnknownCategory { name: String },

    /// Catalog entry failed validation
    #[error("Invalid catalog entry #{index} ({group_id:?}): {reason}")]
    InvalidUnit {
        index: usize,
        group_id: String,
        reason: String,
    },

    /// Two catalog entries would write the same output file
    #[error("Catalog entries #{first} and #{second} both write {path}")]
    DuplicateOutput {
        first: usize,
        second: usize,
        path: String,
    },

    /// Could not determine a platform directory
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Fatal filesystem errors raised while establishing a clean working area
#[derive(Error, Debug)]
pub enum RotationError {
    /// Working area root could not be created
    #[error("Failed to create working area {path}")]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup directory could not be created
    #[error("Failed to create backup directory {path}")]
    BackupDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup area could not be emptied before receiving the previous generation
    #[error("Failed to clear backup entry {path}")]
    ClearBackup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Working area listing failed
    #[error("Failed to list working area {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Network fetch errors for a single download unit
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server error: HTTP {status}")]
    Status { status: u16 },

    /// Fetch exceeded its per-request timeout
    #[error("Fetch timed out after {}", humantime_serde::re::humantime::format_duration(*after))]
    Timeout { after: Duration },

    /// Generic error for other `Fetcher` implementations
    #[error("{0}")]
    Other(String),
}

/// Filesystem errors while storing a single unit's payload
#[derive(Error, Debug)]
pub enum WriteError {
    /// Category directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be written to the temporary file
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not be moved onto the output path
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    Rename {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-unit failure, recorded in the run report
#[derive(Error, Debug)]
pub enum UnitError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl UnitError {
    /// Short tag used in reports and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            UnitError::Fetch(_) => "fetch",
            UnitError::Write(_) => "write",
        }
    }
}

/// Top-level application error that can represent any fatal error
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rotation could not establish a clean working area
    #[error(transparent)]
    Rotation(#[from] RotationError),

    /// HTTP client could not be constructed
    #[error(transparent)]
    Client(#[from] FetchError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Rotation(_) => "rotation",
            AppError::Client(_) => "client",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Rotation result type alias
pub type RotationResult<T> = std::result::Result<T, RotationError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;
