// crates/redshift-sre-aws/src/lib.rs
// ============================================================================
// Module: Redshift SRE AWS Library
// Description: AWS-backed implementations of the monitoring job interfaces.
// Purpose: Connect the core job to Redshift and CloudWatch.
// Dependencies: aws-config, aws-sdk-*, redshift-sre-core, tokio
// ============================================================================

//! ## Overview
//! Adapters implement the core [`redshift_sre_core::WarehouseClient`],
//! [`redshift_sre_core::RecordSink`], and [`redshift_sre_core::MetricsSink`]
//! traits on top of the AWS SDK. SDK futures run on a dedicated Tokio runtime
//! through a blocking bridge so the core stays synchronous.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cloudwatch_logs;
pub mod cloudwatch_metrics;
pub mod error;
pub mod redshift_data;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cloudwatch_logs::CloudWatchLogsSink;
pub use cloudwatch_metrics::CloudWatchMetricsSink;
pub use error::AwsAdapterError;
pub use redshift_data::RedshiftDataClient;
pub use runtime::AwsClientConfig;
pub use runtime::AwsClients;
pub use runtime::AwsRuntime;
