// crates/redshift-sre-config/src/env.rs
// ============================================================================
// Module: Environment Configuration
// Description: Build monitor configuration from environment variables.
// Purpose: Support scheduler deployments that configure through the environment.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! The environment path reads a fixed set of variables from an explicit map so
//! callers and tests control the input. Empty values count as unset. The
//! resulting [`MonitorConfig`] goes through the same validation as TOML input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;

use redshift_sre_core::TimingUnit;

use crate::config::ConfigError;
use crate::config::LogsConfig;
use crate::config::MetricsConfig;
use crate::config::MonitorConfig;
use crate::config::MonitorSection;
use crate::config::PollConfig;
use crate::config::WarehouseConfig;

// ============================================================================
// SECTION: Keys
// ============================================================================

/// Database name.
const DB_NAME: &str = "DB_NAME";
/// Database user.
const DB_USER: &str = "DB_USER";
/// Database password.
const DB_PASSWORD: &str = "DB_PASSWORD";
/// Endpoint host.
const DB_HOST: &str = "DB_HOST";
/// Endpoint port.
const DB_PORT: &str = "DB_PORT";
/// Serverless workgroup.
const WORKGROUP_NAME: &str = "WORKGROUP_NAME";
/// Provisioned cluster identifier.
const CLUSTER_IDENTIFIER: &str = "CLUSTER_IDENTIFIER";
/// Secrets Manager ARN.
const DB_SECRET_ARN: &str = "DB_SECRET_ARN";
/// Log group name.
const LOG_GROUP_NAME: &str = "LOG_GROUP_NAME";
/// Log stream name.
const LOG_STREAM_NAME: &str = "LOG_STREAM_NAME";
/// Threshold in milliseconds.
const ELAPSED_TIME: &str = "ELAPSED_TIME";
/// External schedule interval in minutes.
const SCHEDULE_INTERVAL: &str = "SCHEDULE_INTERVAL";
/// Timing unit of the warehouse columns.
const TIMING_UNIT: &str = "TIMING_UNIT";
/// Metric toggle.
const METRICS_ENABLED: &str = "METRICS_ENABLED";
/// Poll budget in milliseconds.
const POLL_TIMEOUT_MS: &str = "POLL_TIMEOUT_MS";
/// AWS region.
const AWS_REGION: &str = "AWS_REGION";

/// Every environment variable consulted, in documentation order.
pub const ENV_KEYS: [&str; 16] = [
    DB_NAME,
    DB_USER,
    DB_PASSWORD,
    DB_HOST,
    DB_PORT,
    WORKGROUP_NAME,
    CLUSTER_IDENTIFIER,
    DB_SECRET_ARN,
    LOG_GROUP_NAME,
    LOG_STREAM_NAME,
    ELAPSED_TIME,
    SCHEDULE_INTERVAL,
    TIMING_UNIT,
    METRICS_ENABLED,
    POLL_TIMEOUT_MS,
    AWS_REGION,
];

// ============================================================================
// SECTION: Loader
// ============================================================================

impl MonitorConfig {
    /// Builds configuration from an explicit variable map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a required variable is missing or
    /// any value fails to parse or validate.
    pub fn from_env_map(vars: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut poll = PollConfig::default();
        if let Some(timeout_ms) = parse_optional(vars, POLL_TIMEOUT_MS)? {
            poll.timeout_ms = timeout_ms;
        }
        let mut metrics = MetricsConfig::default();
        if let Some(enabled) = optional(vars, METRICS_ENABLED) {
            metrics.enabled = parse_flag(METRICS_ENABLED, &enabled)?;
        }
        let timing_unit = match optional(vars, TIMING_UNIT) {
            Some(value) => parse_timing_unit(&value)?,
            None => TimingUnit::default(),
        };
        let config = Self {
            warehouse: WarehouseConfig {
                database: required(vars, DB_NAME)?,
                user: optional(vars, DB_USER),
                password: optional(vars, DB_PASSWORD),
                host: optional(vars, DB_HOST),
                port: parse_optional(vars, DB_PORT)?,
                workgroup: optional(vars, WORKGROUP_NAME),
                cluster_identifier: optional(vars, CLUSTER_IDENTIFIER),
                secret_arn: optional(vars, DB_SECRET_ARN),
                region: optional(vars, AWS_REGION),
                endpoint: None,
            },
            monitor: MonitorSection {
                elapsed_time_ms: parse_required(vars, ELAPSED_TIME)?,
                timing_unit,
                sql_template: None,
                schedule_interval_minutes: parse_optional(vars, SCHEDULE_INTERVAL)?,
                statement_name: None,
            },
            logs: LogsConfig {
                group: required(vars, LOG_GROUP_NAME)?,
                stream: required(vars, LOG_STREAM_NAME)?,
                create_if_missing: true,
            },
            metrics,
            poll,
        };
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a trimmed value, treating empty values as unset.
fn optional(vars: &BTreeMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).map(|value| value.trim()).filter(|value| !value.is_empty()).map(str::to_string)
}

/// Returns a required trimmed value.
fn required(vars: &BTreeMap<String, String>, key: &str) -> Result<String, ConfigError> {
    optional(vars, key)
        .ok_or_else(|| ConfigError::Invalid(format!("environment variable {key} is required")))
}

/// Parses an optional value.
fn parse_optional<T: FromStr>(
    vars: &BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    optional(vars, key).map(|value| parse_value(key, &value)).transpose()
}

/// Parses a required value.
fn parse_required<T: FromStr>(
    vars: &BTreeMap<String, String>,
    key: &str,
) -> Result<T, ConfigError> {
    parse_value(key, &required(vars, key)?)
}

/// Parses a single value with a keyed error.
fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("environment variable {key} is not valid: {value}")))
}

/// Parses a boolean flag.
fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("environment variable {key} is not a boolean"))),
    }
}

/// Parses a timing unit label.
fn parse_timing_unit(value: &str) -> Result<TimingUnit, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "us" | "microseconds" => Ok(TimingUnit::Microseconds),
        "ms" | "milliseconds" => Ok(TimingUnit::Milliseconds),
        _ => Err(ConfigError::Invalid(format!(
            "environment variable {TIMING_UNIT} must be microseconds or milliseconds"
        ))),
    }
}
