//! CelesTrak Fetcher Library
//!
//! A Rust library for keeping a local snapshot of CelesTrak satellite orbital
//! element sets. Each run moves the previous generation into `backup/` and
//! then fetches every catalog group with rate limiting and per-unit failure
//! isolation.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DEFAULT_WORKER_COUNT, 1);
        assert_eq!(BACKUP_DIR_NAME, "backup");
        assert!(USER_AGENT.contains("CelesTrak-Fetcher"));
        assert!(CELESTRAK_BASE_URL.starts_with("https://"));
    }

    #[test]
    fn test_error_types() {
        let config_error = errors::ConfigError::NoConfigDir;
        let app_error = AppError::Config(config_error);

        assert_eq!(app_error.category(), "config");
    }
}
