//! Configuration management for CelesTrak Fetcher
//!
//! This module provides unified configuration management with multi-source
//! loading, a commented default file for `config init`, and zero-config
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::catalog::{default_catalog, validate_catalog};
use crate::app::limiter::PacingMode;
use crate::app::models::DownloadUnit;
use crate::app::{ClientConfig, OrchestratorConfig};
use crate::constants::{celestrak, env, files, http, limits, logging, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Working area settings
    pub data: DataConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Batch orchestrator settings
    pub orchestrator: OrchestratorConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Replacement for the built-in catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<DownloadUnit>>,
}

/// Where snapshots are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Working area root; `backup/` lives inside it
    pub working_area: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            working_area: PathBuf::from(files::DEFAULT_DATA_DIR),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Provider endpoint
    pub base_url: String,
    pub user_agent: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Connection pool idle timeout (omit for none)
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub pool_idle_timeout: Option<Duration>,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: celestrak::BASE_URL.to_string(),
            user_agent: http::USER_AGENT.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
        }
    }
}

/// TOML-friendly orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfigToml {
    /// Number of concurrent fetch workers
    pub worker_count: usize,
    /// `fixed` or `token-bucket`
    pub pacing: PacingMode,
    /// Spacing between fetches; `0s` disables pacing
    #[serde(with = "humantime_serde")]
    pub pacing_interval: Duration,
    /// Token bucket burst size
    pub burst: u32,
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Bound on the whole run (omit for none)
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub run_timeout: Option<Duration>,
}

impl Default for OrchestratorConfigToml {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            pacing: PacingMode::Fixed,
            pacing_interval: limits::DEFAULT_PACING_INTERVAL,
            burst: 1,
            fetch_timeout: limits::DEFAULT_FETCH_TIMEOUT,
            run_timeout: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, OrchestratorConfig) {
        (
            self.client.to_runtime_config(),
            self.orchestrator.to_runtime_config(),
        )
    }

    /// Catalog to fetch: the configured list, or the built-in one
    pub fn catalog(&self) -> Vec<DownloadUnit> {
        self.catalog.clone().unwrap_or_else(default_catalog)
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data.working_area.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data.working_area".to_string(),
                value: String::new(),
                reason: "Working area path cannot be empty".to_string(),
            });
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            });
        }

        let (client, orchestrator) = self.to_runtime_config();
        client.validate()?;
        orchestrator.validate()?;
        validate_catalog(&self.catalog())
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied on top by the caller.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path });
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `CELESTRAK_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(env::DATA_DIR) {
            if !dir.is_empty() {
                debug!("{} overrides working area: {}", env::DATA_DIR, dir);
                self.data.working_area = PathBuf::from(dir);
            }
        }
        if let Ok(url) = std::env::var(env::BASE_URL) {
            if !url.is_empty() {
                debug!("{} overrides base URL: {}", env::BASE_URL, url);
                self.client.base_url = url;
            }
        }
    }

    /// Write the commented default configuration to `path`
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> ConfigResult<()> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                value: path.display().to_string(),
                reason: "File already exists; use --force to overwrite".to_string(),
            });
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", files::LOCAL_CONFIG_FILE))];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# CelesTrak Fetcher Configuration
# Every setting is optional; omitted values use the defaults shown here.

[data]
# Working area; the previous generation is kept in <working_area>/backup
working_area = "{data_dir}"

[client]
base_url = "{base_url}"
request_timeout = "{request_timeout}"
connect_timeout = "{connect_timeout}"
pool_idle_timeout = "{pool_idle_timeout}"

[orchestrator]
# Concurrent fetch workers (1 = strictly sequential)
worker_count = {workers}
# "fixed" sleeps between fetches, "token-bucket" bounds the aggregate rate
pacing = "fixed"
pacing_interval = "{pacing_interval}"
burst = 1
fetch_timeout = "{fetch_timeout}"
# run_timeout = "15m"

[logging]
level = "{log_level}"  # error, warn, info, debug, trace

# Replace the built-in catalog by listing units explicitly:
# [[catalog]]
# group_id = "stations"
# output_base_name = "stations"
# category = "special-interest"
"#,
            data_dir = files::DEFAULT_DATA_DIR,
            base_url = celestrak::BASE_URL,
            request_timeout = as_secs_literal(http::DEFAULT_TIMEOUT),
            connect_timeout = as_secs_literal(http::CONNECT_TIMEOUT),
            pool_idle_timeout = as_secs_literal(http::POOL_IDLE_TIMEOUT),
            workers = workers::DEFAULT_WORKER_COUNT,
            pacing_interval = as_secs_literal(limits::DEFAULT_PACING_INTERVAL),
            fetch_timeout = as_secs_literal(limits::DEFAULT_FETCH_TIMEOUT),
            log_level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

/// `"{n}s"` form accepted by humantime
fn as_secs_literal(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            pool_idle_timeout: self.pool_idle_timeout,
        }
    }
}

impl OrchestratorConfigToml {
    /// Convert to runtime OrchestratorConfig
    pub fn to_runtime_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            worker_count: self.worker_count,
            pacing: self.pacing,
            pacing_interval: self.pacing_interval,
            burst: self.burst,
            fetch_timeout: self.fetch_timeout,
            run_timeout: self.run_timeout,
        }
    }
}
