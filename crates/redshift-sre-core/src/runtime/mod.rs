// crates/redshift-sre-core/src/runtime/mod.rs
// ============================================================================
// Module: Redshift SRE Runtime
// Description: Query runner, threshold evaluator, emitter, and job orchestration.
// Purpose: Execute one monitoring invocation against the core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the three responsibilities of an invocation
//! (run the query, evaluate records, emit observations) plus the
//! [`MonitorJob`] that sequences them and the reference sinks and clock.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod emitter;
pub mod evaluator;
pub mod job;
pub mod runner;
pub mod sinks;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use emitter::EmissionOutcome;
pub use emitter::MetricsEmitter;
pub use evaluator::EvaluatedRecord;
pub use evaluator::breach_count;
pub use evaluator::evaluate_records;
pub use evaluator::exceeds_threshold;
pub use job::InvocationReport;
pub use job::JobError;
pub use job::MonitorJob;
pub use runner::QueryOutcome;
pub use runner::QueryRunner;
pub use runner::StatementSummary;
pub use sinks::NoopJobEventSink;
pub use sinks::StderrJobEventSink;
pub use sinks::WriterMetricsSink;
pub use sinks::WriterRecordSink;
