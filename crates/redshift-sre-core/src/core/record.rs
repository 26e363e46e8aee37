// crates/redshift-sre-core/src/core/record.rs
// ============================================================================
// Module: Query Execution Records
// Description: Positional row decoding and fixed-order log line rendering.
// Purpose: Turn warehouse rows into validated records and log messages.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Each monitoring row carries eleven positional columns. Decoding is strict:
//! short rows, unexpected types and negative timings are rejected so a bad
//! projection never produces a misleading record. Rendering produces the
//! fixed-order typed-field array consumed by the log dashboard.
//! Invariants:
//! - Timing fields are non-negative [`Duration`] values.
//! - Position 1 is a reserved placeholder and always renders as null.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::core::statement::FieldValue;

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Number of positional columns in a monitoring row.
pub const RECORD_COLUMN_COUNT: usize = 11;

/// Column labels in positional order.
const COLUMN_NAMES: [&str; RECORD_COLUMN_COUNT] = [
    "timestamp",
    "reserved",
    "session_id",
    "iam_role",
    "environment",
    "execution_time",
    "query_type",
    "query_text",
    "elapsed_time",
    "queue_time",
    "lock_wait_time",
];

// ============================================================================
// SECTION: Timing Unit
// ============================================================================

/// Unit the warehouse uses for timing columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingUnit {
    /// Microseconds (system query history views).
    #[default]
    Microseconds,
    /// Milliseconds.
    Milliseconds,
}

impl TimingUnit {
    /// Converts a raw warehouse value into a duration.
    #[must_use]
    pub const fn to_duration(self, raw: u64) -> Duration {
        match self {
            Self::Microseconds => Duration::from_micros(raw),
            Self::Milliseconds => Duration::from_millis(raw),
        }
    }

    /// Expresses a duration in this unit for SQL substitution.
    #[must_use]
    pub const fn express(self, duration: Duration) -> u128 {
        match self {
            Self::Microseconds => duration.as_micros(),
            Self::Milliseconds => duration.as_millis(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record decoding and rendering errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Row has fewer columns than the layout requires.
    #[error("row has {actual} columns, expected at least {expected}")]
    ShortRow {
        /// Required column count.
        expected: usize,
        /// Actual column count.
        actual: usize,
    },
    /// A column holds a value the layout does not accept.
    #[error("column {index} ({name}): {reason}")]
    Column {
        /// Column position.
        index: usize,
        /// Column label.
        name: &'static str,
        /// Failure description.
        reason: String,
    },
    /// Record could not be rendered as a log line.
    #[error("record render failed: {0}")]
    Render(String),
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// One observed query execution, decoded from a monitoring row.
///
/// # Invariants
/// - Created and emitted within a single invocation; never mutated afterwards.
/// - Timing fields are non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryExecutionRecord {
    /// Instant the record describes (query start, or production time when unknown).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Warehouse session identifier.
    pub session_id: Option<i64>,
    /// Identity that ran the query.
    pub iam_role: String,
    /// Deployment label.
    pub environment: String,
    /// Execution time.
    #[serde(serialize_with = "serialize_millis")]
    pub execution_time: Duration,
    /// Query type label.
    pub query_type: String,
    /// Query text.
    pub query_text: String,
    /// Elapsed time compared against the threshold.
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed_time: Duration,
    /// Time spent queued.
    #[serde(serialize_with = "serialize_millis")]
    pub queue_time: Duration,
    /// Time spent waiting on locks.
    #[serde(serialize_with = "serialize_millis")]
    pub lock_wait_time: Duration,
}

impl QueryExecutionRecord {
    /// Decodes a positional monitoring row.
    ///
    /// `produced_at` fills the timestamp when the row's timestamp column is null.
    /// Columns past the layout are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the row is short or a column is invalid.
    pub fn from_row(
        row: &[FieldValue],
        unit: TimingUnit,
        produced_at: OffsetDateTime,
    ) -> Result<Self, RecordError> {
        if row.len() < RECORD_COLUMN_COUNT {
            return Err(RecordError::ShortRow {
                expected: RECORD_COLUMN_COUNT,
                actual: row.len(),
            });
        }
        Ok(Self {
            timestamp: timestamp_column(row, 0)?.unwrap_or(produced_at),
            session_id: session_column(row, 2)?,
            iam_role: string_column(row, 3)?,
            environment: string_column(row, 4)?,
            execution_time: timing_column(row, 5, unit)?,
            query_type: string_column(row, 6)?,
            query_text: string_column(row, 7)?,
            elapsed_time: timing_column(row, 8, unit)?,
            queue_time: timing_column(row, 9, unit)?,
            lock_wait_time: timing_column(row, 10, unit)?,
        })
    }

    /// Renders the fixed-order typed-field log message.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Render`] when the timestamp cannot be formatted.
    pub fn render_log_line(&self) -> Result<String, RecordError> {
        let timestamp =
            self.timestamp.format(&Rfc3339).map_err(|err| RecordError::Render(err.to_string()))?;
        let session = self.session_id.map_or_else(null_field, |id| long_field(i128::from(id)));
        let fields = [
            string_field(&timestamp),
            null_field(),
            session,
            string_field(&self.iam_role),
            string_field(&self.environment),
            millis_field(self.execution_time),
            string_field(&self.query_type),
            string_field(&self.query_text),
            millis_field(self.elapsed_time),
            millis_field(self.queue_time),
            millis_field(self.lock_wait_time),
        ];
        Ok(format!("[{}]", fields.join(", ")))
    }
}

// ============================================================================
// SECTION: Log Line
// ============================================================================

/// Log event ready for a record sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    /// Event time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Rendered message.
    pub message: String,
}

impl LogLine {
    /// Renders a record into a log line stamped with `produced_at`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Render`] when the record cannot be rendered.
    pub fn from_record(
        record: &QueryExecutionRecord,
        produced_at: OffsetDateTime,
    ) -> Result<Self, RecordError> {
        let millis = produced_at.unix_timestamp_nanos() / 1_000_000;
        Ok(Self {
            timestamp_ms: i64::try_from(millis).unwrap_or(i64::MAX),
            message: record.render_log_line()?,
        })
    }
}

// ============================================================================
// SECTION: Column Decoding
// ============================================================================

/// Builds a column error for `index`.
fn column_error(index: usize, reason: impl Into<String>) -> RecordError {
    RecordError::Column {
        index,
        name: COLUMN_NAMES[index],
        reason: reason.into(),
    }
}

/// Builds a type mismatch error for `index`.
fn type_error(index: usize, expected: &str, actual: &FieldValue) -> RecordError {
    column_error(index, format!("expected {expected}, found {}", actual.type_name()))
}

/// Decodes a required string column.
fn string_column(row: &[FieldValue], index: usize) -> Result<String, RecordError> {
    match &row[index] {
        FieldValue::String(value) => Ok(value.clone()),
        other => Err(type_error(index, "string", other)),
    }
}

/// Decodes a non-negative timing column.
fn timing_column(
    row: &[FieldValue],
    index: usize,
    unit: TimingUnit,
) -> Result<Duration, RecordError> {
    match &row[index] {
        FieldValue::Long(value) => u64::try_from(*value)
            .map(|raw| unit.to_duration(raw))
            .map_err(|_| column_error(index, format!("negative timing {value}"))),
        other => Err(type_error(index, "long", other)),
    }
}

/// Decodes the nullable session identifier.
fn session_column(row: &[FieldValue], index: usize) -> Result<Option<i64>, RecordError> {
    match &row[index] {
        FieldValue::Null => Ok(None),
        FieldValue::Long(value) => Ok(Some(*value)),
        FieldValue::String(value) => value
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| column_error(index, format!("non-numeric session id {value:?}"))),
        other => Err(type_error(index, "long", other)),
    }
}

/// Decodes the nullable timestamp column.
fn timestamp_column(
    row: &[FieldValue],
    index: usize,
) -> Result<Option<OffsetDateTime>, RecordError> {
    match &row[index] {
        FieldValue::Null => Ok(None),
        FieldValue::String(value) => parse_timestamp(value)
            .map(Some)
            .ok_or_else(|| column_error(index, format!("unrecognized timestamp {value:?}"))),
        other => Err(type_error(index, "string", other)),
    }
}

/// Parses RFC 3339 or warehouse `YYYY-MM-DD HH:MM:SS[.ffffff]` timestamps as UTC.
fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }
    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            value,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    })
    .ok()
    .map(PrimitiveDateTime::assume_utc)
}

// ============================================================================
// SECTION: Rendering Helpers
// ============================================================================

/// Renders a typed string field.
fn string_field(value: &str) -> String {
    format!("{{\"stringValue\": {}}}", Value::String(value.to_string()))
}

/// Renders a typed long field.
fn long_field(value: i128) -> String {
    format!("{{\"longValue\": {value}}}")
}

/// Renders a typed null field.
fn null_field() -> String {
    "{\"isNull\": true}".to_string()
}

/// Renders a duration as a long field in milliseconds.
fn millis_field(value: Duration) -> String {
    long_field(i128::try_from(value.as_millis()).unwrap_or(i128::MAX))
}

/// Serializes a duration as whole milliseconds.
fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
