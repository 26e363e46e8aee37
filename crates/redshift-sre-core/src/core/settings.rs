// crates/redshift-sre-core/src/core/settings.rs
// ============================================================================
// Module: Job Settings
// Description: Explicit per-invocation settings for the monitoring job.
// Purpose: Carry connection, threshold, polling, and emission parameters.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`JobSettings`] is built by the configuration layer and passed into the job
//! at invocation time; the core never reads process-wide state. The monitoring
//! SQL is a template whose [`THRESHOLD_PLACEHOLDER`] is replaced with the
//! threshold expressed in the configured [`TimingUnit`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;

use crate::core::record::TimingUnit;
use crate::core::statement::ConnectionParams;
use crate::core::statement::StatementRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Metric namespace for threshold breaches.
pub const METRIC_NAMESPACE: &str = "RedshiftQueryMetrics";
/// Counter metric name for threshold breaches.
pub const METRIC_NAME: &str = "RowsExceedingElapsedTimeThreshold";
/// Dimension carrying the log group name.
const LOG_GROUP_DIMENSION: &str = "LogGroupName";
/// Dimension carrying the log stream name.
const LOG_STREAM_DIMENSION: &str = "LogStreamName";
/// Placeholder replaced with the threshold in the SQL template.
pub const THRESHOLD_PLACEHOLDER: &str = "{elapsed_time}";
/// Default poll interval.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default poll budget, matching the five-minute function timeout.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Default monitoring query: running statements over the threshold, newest first.
pub const DEFAULT_SQL_TEMPLATE: &str = "select h.start_time, null as reserved, h.session_id, \
     coalesce(trim(u.usename), cast(h.user_id as varchar)) as iam_role, \
     h.database_name as environment, h.execution_time, h.query_type, h.query_text, \
     h.elapsed_time, h.queue_time, h.lock_wait_time \
     from sys_query_history h left join pg_user u on u.usesysid = h.user_id \
     where h.status = 'running' and h.elapsed_time > {elapsed_time} and h.end_time is null \
     order by h.start_time desc;";

// ============================================================================
// SECTION: Polling
// ============================================================================

/// Status polling policy.
///
/// # Invariants
/// - `interval` is non-zero and not larger than `timeout` once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollPolicy {
    /// Delay between status polls.
    pub interval: Duration,
    /// Total wait budget before the runner reports a timeout.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Emission Targets
// ============================================================================

/// Log group and stream receiving record lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogDestination {
    /// Log group name.
    pub group: String,
    /// Log stream name.
    pub stream: String,
}

/// Metric dimension (name/value tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDimension {
    /// Dimension name.
    pub name: String,
    /// Dimension value.
    pub value: String,
}

/// Metric unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Plain count.
    Count,
}

/// Breach metric definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSpec {
    /// Whether breaches emit a data point.
    pub enabled: bool,
    /// Metric namespace.
    pub namespace: String,
    /// Metric name.
    pub metric_name: String,
    /// Dimensions attached to every data point.
    pub dimensions: Vec<MetricDimension>,
}

impl MetricSpec {
    /// Builds the default breach metric dimensioned by the log destination.
    #[must_use]
    pub fn for_destination(destination: &LogDestination) -> Self {
        Self {
            enabled: true,
            namespace: METRIC_NAMESPACE.to_string(),
            metric_name: METRIC_NAME.to_string(),
            dimensions: vec![
                MetricDimension {
                    name: LOG_GROUP_DIMENSION.to_string(),
                    value: destination.group.clone(),
                },
                MetricDimension {
                    name: LOG_STREAM_DIMENSION.to_string(),
                    value: destination.stream.clone(),
                },
            ],
        }
    }

    /// Builds a counter data point with the given value.
    #[must_use]
    pub fn datum(&self, value: f64) -> MetricDatum {
        MetricDatum {
            namespace: self.namespace.clone(),
            metric_name: self.metric_name.clone(),
            dimensions: self.dimensions.clone(),
            value,
            unit: MetricUnit::Count,
        }
    }
}

/// Single metric data point handed to a metrics sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDatum {
    /// Metric namespace.
    pub namespace: String,
    /// Metric name.
    pub metric_name: String,
    /// Dimensions.
    pub dimensions: Vec<MetricDimension>,
    /// Data point value.
    pub value: f64,
    /// Unit.
    pub unit: MetricUnit,
}

// ============================================================================
// SECTION: Job Settings
// ============================================================================

/// Complete settings for one monitoring invocation.
///
/// # Invariants
/// - Produced from validated configuration; the core does not re-validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSettings {
    /// Warehouse connection parameters.
    pub connection: ConnectionParams,
    /// Monitoring SQL template.
    pub sql_template: String,
    /// Elapsed-time threshold; strictly greater values breach.
    pub threshold: Duration,
    /// Unit of warehouse timing columns.
    pub timing_unit: TimingUnit,
    /// Status polling policy.
    pub poll: PollPolicy,
    /// Destination for record lines.
    pub log_destination: LogDestination,
    /// Breach metric definition.
    pub metric: MetricSpec,
    /// Optional statement label.
    pub statement_name: Option<String>,
}

impl JobSettings {
    /// Returns settings with a replaced threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Renders the monitoring SQL with the threshold substituted.
    #[must_use]
    pub fn render_sql(&self) -> String {
        let threshold = self.timing_unit.express(self.threshold).to_string();
        self.sql_template.replace(THRESHOLD_PLACEHOLDER, &threshold)
    }

    /// Builds the statement request for this invocation.
    #[must_use]
    pub fn statement_request(&self) -> StatementRequest {
        StatementRequest {
            connection: self.connection.clone(),
            sql: self.render_sql(),
            statement_name: self.statement_name.clone(),
        }
    }
}
