// crates/redshift-sre-config/src/config.rs
// ============================================================================
// Module: Monitor Configuration
// Description: Configuration loading and validation for the monitoring job.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: redshift-sre-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! or assembled from environment variables. Missing or invalid configuration
//! fails closed. [`MonitorConfig::to_settings`] turns a validated config into
//! the explicit [`JobSettings`] handed to the job.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use redshift_sre_core::ConnectionParams;
use redshift_sre_core::DEFAULT_SQL_TEMPLATE;
use redshift_sre_core::JobSettings;
use redshift_sre_core::LogDestination;
use redshift_sre_core::MetricSpec;
use redshift_sre_core::PollPolicy;
use redshift_sre_core::THRESHOLD_PLACEHOLDER;
use redshift_sre_core::TimingUnit;
use redshift_sre_core::WarehouseTarget;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "redshift-sre.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "REDSHIFT_SRE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a log group or log stream name.
pub(crate) const MAX_LOG_NAME_LENGTH: usize = 512;
/// Maximum length of the monitoring SQL template.
pub(crate) const MAX_SQL_TEMPLATE_LENGTH: usize = 64 * 1024;
/// Maximum length of a statement label.
pub(crate) const MAX_STATEMENT_NAME_LENGTH: usize = 500;
/// Maximum schedule interval in minutes (one day).
pub(crate) const MAX_SCHEDULE_INTERVAL_MINUTES: u32 = 24 * 60;
/// Default poll interval in milliseconds.
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Default poll budget in milliseconds.
pub(crate) const DEFAULT_POLL_TIMEOUT_MS: u64 = 300_000;
/// Maximum poll budget in milliseconds.
pub(crate) const MAX_POLL_TIMEOUT_MS: u64 = 900_000;
/// Placeholder shown instead of secret values.
pub(crate) const REDACTED: &str = "[redacted]";

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Monitoring job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Warehouse connection settings.
    pub warehouse: WarehouseConfig,
    /// Threshold and query settings.
    pub monitor: MonitorSection,
    /// Log destination settings.
    pub logs: LogsConfig,
    /// Breach metric settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Statement polling settings.
    #[serde(default)]
    pub poll: PollConfig,
}

impl MonitorConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from a file when one is named or present, otherwise from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some() {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_NAME);
        if default_path.is_file() {
            return Self::load(Some(default_path));
        }
        Self::from_env()
    }

    /// Builds configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: BTreeMap<String, String> = env::vars().collect();
        Self::from_env_map(&vars)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.warehouse.validate()?;
        self.monitor.validate()?;
        self.logs.validate()?;
        self.poll.validate()?;
        Ok(())
    }

    /// Converts validated configuration into job settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn to_settings(&self) -> Result<JobSettings, ConfigError> {
        self.validate()?;
        let log_destination = LogDestination {
            group: self.logs.group.trim().to_string(),
            stream: self.logs.stream.trim().to_string(),
        };
        let mut metric = MetricSpec::for_destination(&log_destination);
        metric.enabled = self.metrics.enabled;
        Ok(JobSettings {
            connection: self.warehouse.connection()?,
            sql_template: self
                .monitor
                .sql_template
                .clone()
                .unwrap_or_else(|| DEFAULT_SQL_TEMPLATE.to_string()),
            threshold: Duration::from_millis(self.monitor.elapsed_time_ms),
            timing_unit: self.monitor.timing_unit,
            poll: self.poll.policy(),
            log_destination,
            metric,
            statement_name: self.monitor.statement_name.clone(),
        })
    }

    /// Returns a copy with secret values replaced for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.warehouse.password.is_some() {
            copy.warehouse.password = Some(REDACTED.to_string());
        }
        copy
    }
}

// ============================================================================
// SECTION: Warehouse
// ============================================================================

/// Warehouse connection configuration.
///
/// # Invariants
/// - Exactly one of `workgroup` and `cluster_identifier` is set.
/// - Provisioned clusters require `user` unless `secret_arn` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Database name.
    pub database: String,
    /// Database user.
    #[serde(default)]
    pub user: Option<String>,
    /// Database password. Accepted for compatibility; never sent to the data API.
    #[serde(default)]
    pub password: Option<String>,
    /// Endpoint host name.
    #[serde(default)]
    pub host: Option<String>,
    /// Endpoint port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Serverless workgroup name.
    #[serde(default)]
    pub workgroup: Option<String>,
    /// Provisioned cluster identifier.
    #[serde(default)]
    pub cluster_identifier: Option<String>,
    /// Secrets Manager ARN with database credentials.
    #[serde(default)]
    pub secret_arn: Option<String>,
    /// AWS region override.
    #[serde(default)]
    pub region: Option<String>,
    /// AWS endpoint override, for local emulators.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl WarehouseConfig {
    /// Validates warehouse settings.
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("warehouse.database", &self.database)?;
        optional_non_empty("warehouse.user", self.user.as_deref())?;
        optional_non_empty("warehouse.host", self.host.as_deref())?;
        optional_non_empty("warehouse.workgroup", self.workgroup.as_deref())?;
        optional_non_empty("warehouse.cluster_identifier", self.cluster_identifier.as_deref())?;
        optional_non_empty("warehouse.secret_arn", self.secret_arn.as_deref())?;
        optional_non_empty("warehouse.region", self.region.as_deref())?;
        if let Some(endpoint) = &self.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(
                "warehouse.endpoint must be an http(s) url".to_string(),
            ));
        }
        if self.port == Some(0) {
            return Err(ConfigError::Invalid("warehouse.port must be non-zero".to_string()));
        }
        match (&self.workgroup, &self.cluster_identifier) {
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "warehouse.workgroup and warehouse.cluster_identifier are mutually exclusive"
                    .to_string(),
            )),
            (None, None) => Err(ConfigError::Invalid(
                "warehouse.workgroup or warehouse.cluster_identifier is required".to_string(),
            )),
            (None, Some(_)) if self.user.is_none() && self.secret_arn.is_none() => {
                Err(ConfigError::Invalid(
                    "warehouse.user or warehouse.secret_arn is required for provisioned clusters"
                        .to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Builds core connection parameters.
    fn connection(&self) -> Result<ConnectionParams, ConfigError> {
        let target = match (&self.workgroup, &self.cluster_identifier) {
            (Some(workgroup), None) => WarehouseTarget::Serverless {
                workgroup: workgroup.trim().to_string(),
            },
            (None, Some(cluster_identifier)) => WarehouseTarget::Provisioned {
                cluster_identifier: cluster_identifier.trim().to_string(),
                db_user: self.user.clone().unwrap_or_default(),
            },
            _ => {
                return Err(ConfigError::Invalid(
                    "warehouse target is ambiguous or missing".to_string(),
                ));
            }
        };
        Ok(ConnectionParams {
            database: self.database.trim().to_string(),
            user: self.user.clone(),
            host: self.host.clone(),
            port: self.port,
            target,
            secret_arn: self.secret_arn.clone(),
        })
    }
}

// ============================================================================
// SECTION: Monitor
// ============================================================================

/// Threshold and monitoring query configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSection {
    /// Elapsed-time threshold in milliseconds.
    pub elapsed_time_ms: u64,
    /// Unit of the warehouse timing columns.
    #[serde(default)]
    pub timing_unit: TimingUnit,
    /// Monitoring SQL template; defaults to the built-in history query.
    #[serde(default)]
    pub sql_template: Option<String>,
    /// External schedule interval in minutes; informational only.
    #[serde(default)]
    pub schedule_interval_minutes: Option<u32>,
    /// Statement label shown in warehouse history.
    #[serde(default)]
    pub statement_name: Option<String>,
}

impl MonitorSection {
    /// Validates monitor settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(template) = &self.sql_template {
            require_non_empty("monitor.sql_template", template)?;
            if template.len() > MAX_SQL_TEMPLATE_LENGTH {
                return Err(ConfigError::Invalid(
                    "monitor.sql_template exceeds max length".to_string(),
                ));
            }
        }
        if let Some(minutes) = self.schedule_interval_minutes
            && !(1 ..= MAX_SCHEDULE_INTERVAL_MINUTES).contains(&minutes)
        {
            return Err(ConfigError::Invalid(format!(
                "monitor.schedule_interval_minutes must be between 1 and \
                 {MAX_SCHEDULE_INTERVAL_MINUTES}"
            )));
        }
        if let Some(name) = &self.statement_name {
            require_non_empty("monitor.statement_name", name)?;
            if name.len() > MAX_STATEMENT_NAME_LENGTH {
                return Err(ConfigError::Invalid(
                    "monitor.statement_name exceeds max length".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Returns true when the configured template references the threshold.
    #[must_use]
    pub fn template_uses_threshold(&self) -> bool {
        self.sql_template.as_deref().is_none_or(|template| template.contains(THRESHOLD_PLACEHOLDER))
    }
}

// ============================================================================
// SECTION: Logs
// ============================================================================

/// Log destination configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Log group name.
    pub group: String,
    /// Log stream name.
    pub stream: String,
    /// Create the group and stream before writing.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

impl LogsConfig {
    /// Validates log destination settings.
    fn validate(&self) -> Result<(), ConfigError> {
        require_bounded("logs.group", &self.group, MAX_LOG_NAME_LENGTH)?;
        require_bounded("logs.stream", &self.stream, MAX_LOG_NAME_LENGTH)?;
        if self.stream.contains(':') || self.stream.contains('*') {
            return Err(ConfigError::Invalid(
                "logs.stream must not contain ':' or '*'".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Breach metric configuration.
///
/// # Invariants
/// - The namespace, metric name, and dimensions are fixed; only emission is
///   configurable, and unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Emit the breach metric.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
        }
    }
}

// ============================================================================
// SECTION: Polling
// ============================================================================

/// Statement polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Total wait budget in milliseconds.
    #[serde(default = "default_poll_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
        }
    }
}

impl PollConfig {
    /// Validates polling settings.
    fn validate(self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("poll.interval_ms must be non-zero".to_string()));
        }
        if self.timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "poll.timeout_ms must not exceed {MAX_POLL_TIMEOUT_MS}"
            )));
        }
        if self.interval_ms > self.timeout_ms {
            return Err(ConfigError::Invalid(
                "poll.interval_ms must not exceed poll.timeout_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the core polling policy.
    #[must_use]
    pub const fn policy(self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Rejects empty or whitespace-only values.
fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Rejects present-but-empty optional values.
fn optional_non_empty(field: &str, value: Option<&str>) -> Result<(), ConfigError> {
    value.map_or(Ok(()), |value| require_non_empty(field, value))
}

/// Rejects empty or overlong values.
fn require_bounded(field: &str, value: &str, max: usize) -> Result<(), ConfigError> {
    require_non_empty(field, value)?;
    if value.trim().len() > max {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length of {max}")));
    }
    Ok(())
}

/// Serde default for enabled flags.
const fn default_true() -> bool {
    true
}

/// Serde default for the poll interval.
const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Serde default for the poll budget.
const fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT_MS
}
