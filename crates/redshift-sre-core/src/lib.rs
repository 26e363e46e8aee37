// crates/redshift-sre-core/src/lib.rs
// ============================================================================
// Module: Redshift SRE Core Library
// Description: Public API surface for the Redshift SRE monitoring job.
// Purpose: Expose the record model, backend interfaces, and job runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Redshift SRE core runs a single monitoring invocation: it executes one
//! query against the warehouse, decodes the result rows into
//! [`QueryExecutionRecord`] values, compares each record with the elapsed-time
//! threshold, and emits log lines plus an optional counter metric. It is
//! backend-agnostic and integrates through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::JobEventSink;
pub use interfaces::MetricsSink;
pub use interfaces::ObservabilityError;
pub use interfaces::RecordSink;
pub use interfaces::WarehouseClient;
pub use interfaces::WarehouseError;
pub use runtime::EmissionOutcome;
pub use runtime::EvaluatedRecord;
pub use runtime::InvocationReport;
pub use runtime::JobError;
pub use runtime::MetricsEmitter;
pub use runtime::MonitorJob;
pub use runtime::NoopJobEventSink;
pub use runtime::QueryOutcome;
pub use runtime::QueryRunner;
pub use runtime::StatementSummary;
pub use runtime::StderrJobEventSink;
pub use runtime::SystemClock;
pub use runtime::WriterMetricsSink;
pub use runtime::WriterRecordSink;
pub use runtime::breach_count;
pub use runtime::evaluate_records;
pub use runtime::exceeds_threshold;
