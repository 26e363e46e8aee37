// crates/redshift-sre-core/src/core/statement.rs
// ============================================================================
// Module: Warehouse Statements
// Description: Statement requests, status tracking, and result set values.
// Purpose: Describe the warehouse conversation without backend-specific types.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A monitoring invocation submits one [`StatementRequest`], polls its
//! [`StatementStatus`] until a terminal state, then fetches a [`ResultSet`].
//! Field values mirror the typed cells a data API returns so the record decoder
//! can enforce column types positionally.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Warehouse-assigned statement identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    /// Creates a new statement identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Connection
// ============================================================================

/// Compute target that executes the statement.
///
/// # Invariants
/// - Names are non-empty once produced by validated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarehouseTarget {
    /// Serverless workgroup; credentials derive from the caller identity.
    Serverless {
        /// Workgroup name.
        workgroup: String,
    },
    /// Provisioned cluster with temporary database-user credentials.
    Provisioned {
        /// Cluster identifier.
        cluster_identifier: String,
        /// Database user used to obtain credentials.
        db_user: String,
    },
}

/// Connection parameters for the warehouse endpoint.
///
/// # Invariants
/// - `database` is non-empty.
/// - `host` and `port` are informational; data API backends route by target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Database name.
    pub database: String,
    /// Database user label when configured.
    pub user: Option<String>,
    /// Endpoint host name when configured.
    pub host: Option<String>,
    /// Endpoint port when configured.
    pub port: Option<u16>,
    /// Compute target.
    pub target: WarehouseTarget,
    /// Secret ARN holding database credentials, when used instead of IAM.
    pub secret_arn: Option<String>,
}

/// Statement submission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRequest {
    /// Connection parameters.
    pub connection: ConnectionParams,
    /// SQL text to execute.
    pub sql: String,
    /// Optional statement label shown in warehouse history.
    pub statement_name: Option<String>,
}

/// Identifiers returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedStatement {
    /// Statement identifier.
    pub id: StatementId,
    /// Warehouse session identifier when the backend reports one.
    pub session_id: Option<String>,
}

// ============================================================================
// SECTION: Status
// ============================================================================

/// Execution status of a submitted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Accepted by the warehouse.
    Submitted,
    /// Picked up by the query queue.
    Picked,
    /// Running.
    Started,
    /// Completed successfully.
    Finished,
    /// Completed with an error.
    Failed,
    /// Cancelled before completion.
    Aborted,
}

impl StatementStatus {
    /// Returns true when no further progress can occur.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Aborted)
    }

    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Picked => "picked",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementDescription {
    /// Current status.
    pub status: StatementStatus,
    /// Error message reported for failed statements.
    pub error: Option<String>,
    /// Warehouse-reported execution duration, once known.
    pub duration: Option<Duration>,
}

impl StatementDescription {
    /// Creates a description with no error or duration.
    #[must_use]
    pub const fn with_status(status: StatementStatus) -> Self {
        Self {
            status,
            error: None,
            duration: None,
        }
    }
}

// ============================================================================
// SECTION: Result Set
// ============================================================================

/// Typed result cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// SQL null.
    Null,
    /// 64-bit integer.
    Long(i64),
    /// Double-precision float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Boolean(bool),
    /// Binary payload.
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Returns a short type label used in decode errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Blob(_) => "blob",
        }
    }
}

/// One result row in column order.
pub type ResultRow = Vec<FieldValue>;

/// Complete result set of a finished statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Rows in warehouse order.
    pub rows: Vec<ResultRow>,
}
