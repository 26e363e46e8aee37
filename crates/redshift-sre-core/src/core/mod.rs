// crates/redshift-sre-core/src/core/mod.rs
// ============================================================================
// Module: Redshift SRE Core Types
// Description: Data model for statements, result rows, records, and settings.
// Purpose: Provide the transient per-invocation types shared by all crates.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types describe one monitoring invocation: the statement submitted to
//! the warehouse, the rows it returns, the [`QueryExecutionRecord`] decoded from
//! each row, and the [`JobSettings`] that drive the run. None of these values
//! outlive the invocation that produced them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod events;
pub mod record;
pub mod settings;
pub mod statement;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::JobEvent;
pub use events::JobState;
pub use record::LogLine;
pub use record::QueryExecutionRecord;
pub use record::RECORD_COLUMN_COUNT;
pub use record::RecordError;
pub use record::TimingUnit;
pub use settings::DEFAULT_SQL_TEMPLATE;
pub use settings::JobSettings;
pub use settings::LogDestination;
pub use settings::METRIC_NAME;
pub use settings::METRIC_NAMESPACE;
pub use settings::MetricDatum;
pub use settings::MetricDimension;
pub use settings::MetricSpec;
pub use settings::MetricUnit;
pub use settings::PollPolicy;
pub use settings::THRESHOLD_PLACEHOLDER;
pub use statement::ConnectionParams;
pub use statement::FieldValue;
pub use statement::ResultRow;
pub use statement::ResultSet;
pub use statement::StatementDescription;
pub use statement::StatementId;
pub use statement::StatementRequest;
pub use statement::StatementStatus;
pub use statement::SubmittedStatement;
pub use statement::WarehouseTarget;
