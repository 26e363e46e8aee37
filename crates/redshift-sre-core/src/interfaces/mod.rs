// crates/redshift-sre-core/src/interfaces/mod.rs
// ============================================================================
// Module: Redshift SRE Interfaces
// Description: Backend-agnostic interfaces for the warehouse and observability sinks.
// Purpose: Define the contract surfaces used by the monitoring job runtime.
// Dependencies: crate::core, thiserror, time
// ============================================================================

//! ## Overview
//! Interfaces define how the monitoring job reaches the warehouse, the log
//! backend and the metrics backend without embedding SDK types. Warehouse
//! errors are fatal for an invocation; observability errors are downgraded to
//! warnings by the runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use time::OffsetDateTime;

use crate::core::JobEvent;
use crate::core::LogLine;
use crate::core::MetricDatum;
use crate::core::ResultSet;
use crate::core::StatementDescription;
use crate::core::StatementId;
use crate::core::StatementRequest;
use crate::core::SubmittedStatement;

// ============================================================================
// SECTION: Warehouse
// ============================================================================

/// Warehouse client errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarehouseError {
    /// Endpoint unreachable or caller not authorized.
    #[error("warehouse connectivity error: {0}")]
    Connectivity(String),
    /// Warehouse rejected or could not complete the request.
    #[error("warehouse execution error: {0}")]
    Execution(String),
}

/// Asynchronous statement API of a data warehouse.
pub trait WarehouseClient {
    /// Submits a statement for asynchronous execution.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the statement cannot be submitted.
    fn submit(&self, request: &StatementRequest) -> Result<SubmittedStatement, WarehouseError>;

    /// Returns the current status of a statement.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the status cannot be read.
    fn describe(&self, id: &StatementId) -> Result<StatementDescription, WarehouseError>;

    /// Fetches the complete result set of a finished statement.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the result cannot be read.
    fn fetch(&self, id: &StatementId) -> Result<ResultSet, WarehouseError>;

    /// Requests cancellation of a running statement.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the cancel request fails.
    fn cancel(&self, id: &StatementId) -> Result<(), WarehouseError>;
}

// ============================================================================
// SECTION: Observability Sinks
// ============================================================================

/// Log and metric backend errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservabilityError {
    /// Log destination could not be prepared or written.
    #[error("log write failed: {0}")]
    LogWrite(String),
    /// Metric data could not be written.
    #[error("metric write failed: {0}")]
    MetricWrite(String),
}

/// Destination for rendered record lines.
pub trait RecordSink {
    /// Ensures the destination exists before the first write.
    ///
    /// # Errors
    ///
    /// Returns [`ObservabilityError`] when the destination cannot be prepared.
    fn prepare(&self) -> Result<(), ObservabilityError> {
        Ok(())
    }

    /// Writes a batch of lines in order.
    ///
    /// # Errors
    ///
    /// Returns [`ObservabilityError`] when the batch cannot be written.
    fn write(&self, lines: &[LogLine]) -> Result<(), ObservabilityError>;
}

/// Destination for metric data points.
pub trait MetricsSink {
    /// Writes one data point.
    ///
    /// # Errors
    ///
    /// Returns [`ObservabilityError`] when the data point cannot be written.
    fn put(&self, datum: &MetricDatum) -> Result<(), ObservabilityError>;
}

/// Sink for structured job events.
pub trait JobEventSink {
    /// Records a job event. Implementations must not fail the invocation.
    fn record(&self, event: &JobEvent);
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source used for polling and record timestamps.
pub trait Clock {
    /// Returns a monotonic instant.
    fn now(&self) -> Instant;

    /// Returns the current wall-clock time in UTC.
    fn wall_clock(&self) -> OffsetDateTime;

    /// Suspends the caller for `duration`.
    fn sleep(&self, duration: Duration);
}
