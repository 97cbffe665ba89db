//! Application constants for CelesTrak Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the working area root
    pub const DATA_DIR: &str = "CELESTRAK_DATA_DIR";

    /// Overrides the provider base URL
    pub const BASE_URL: &str = "CELESTRAK_BASE_URL";
}

/// CelesTrak provider endpoint
pub mod celestrak {
    /// GP element set query endpoint
    pub const BASE_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";

    /// Query parameter naming the satellite group
    pub const GROUP_PARAM: &str = "GROUP";

    /// Query parameter selecting the output format
    pub const FORMAT_PARAM: &str = "FORMAT";

    /// Output format requested for every group (OMM as JSON)
    pub const FORMAT_JSON: &str = "json";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("CelesTrak-Fetcher/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// Pacing between outbound requests
pub mod limits {
    use super::Duration;

    /// Fixed spacing between consecutive fetches
    pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_secs(1);

    /// Per-fetch timeout, distinct from the overall run timeout
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of fetch workers (one request in flight at a time)
    pub const DEFAULT_WORKER_COUNT: usize = 1;

    /// Maximum recommended concurrent workers
    pub const MAX_WORKER_COUNT: usize = 16;

    /// Channel buffer size for progress events
    pub const EVENT_BUFFER_SIZE: usize = 64;
}

/// Working area layout
pub mod files {
    /// Reserved subdirectory holding the previous generation
    pub const BACKUP_DIR_NAME: &str = "backup";

    /// Extension of every output file
    pub const OUTPUT_EXTENSION: &str = "json";

    /// Temporary file suffix for atomic writes
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Run timestamp format; contains exactly one underscore so stems split
    /// from the right into `{base}_{date}_{time}`
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Default working area when nothing else is configured
    pub const DEFAULT_DATA_DIR: &str = "./data";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "celestrak-fetcher.toml";

    /// Directory name under the platform config dir
    pub const CONFIG_DIR_NAME: &str = "celestrak-fetcher";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

pub use celestrak::BASE_URL as CELESTRAK_BASE_URL;
pub use files::BACKUP_DIR_NAME;
pub use http::USER_AGENT;
pub use limits::{DEFAULT_FETCH_TIMEOUT, DEFAULT_PACING_INTERVAL};
pub use workers::DEFAULT_WORKER_COUNT;
