// crates/redshift-sre-aws/src/runtime.rs
// ============================================================================
// Module: AWS Runtime Bridge
// Description: Shared Tokio runtime, SDK config loading, and client bundle.
// Purpose: Drive SDK futures to completion from synchronous adapter calls.
// Dependencies: aws-config, aws-sdk-*, tokio
// ============================================================================

//! ## Overview
//! Adapters expose synchronous traits while the SDK is async. Each call is
//! driven through [`block_on_with_runtime`], which reuses a surrounding
//! multi-threaded runtime when there is one and otherwise runs on the
//! adapter-owned runtime. The owned runtime is dropped on a helper thread so
//! dropping an adapter inside async code never blocks the caller's runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::SdkConfig;
use aws_config::timeout::TimeoutConfig;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

use crate::cloudwatch_logs::CloudWatchLogsSink;
use crate::cloudwatch_metrics::CloudWatchMetricsSink;
use crate::error::AwsAdapterError;
use crate::redshift_data::RedshiftDataClient;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Connect timeout ceiling applied alongside an operation timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on an SDK future using a compatible runtime.
pub(crate) fn block_on_with_runtime<F, T>(runtime: &Runtime, future: F) -> Result<T, AwsAdapterError>
where
    F: Future<Output = Result<T, AwsAdapterError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| AwsAdapterError::Runtime(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx
            .recv()
            .unwrap_or_else(|_| Err(AwsAdapterError::Runtime("aws call thread join failed".to_string())));
    }

    runtime.block_on(future)
}

/// Adapter-owned Tokio runtime shared by the AWS clients.
#[derive(Clone)]
pub struct AwsRuntime {
    /// Runtime handle; `None` only while dropping.
    runtime: Option<Arc<Runtime>>,
}

impl AwsRuntime {
    /// Creates a runtime for adapter calls.
    ///
    /// # Errors
    ///
    /// Returns [`AwsAdapterError::Runtime`] when the runtime cannot be built.
    pub fn new() -> Result<Self, AwsAdapterError> {
        let runtime = Runtime::new().map_err(|err| AwsAdapterError::Runtime(err.to_string()))?;
        Ok(Self {
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Drives `future` to completion.
    pub(crate) fn block_on<F, T>(&self, future: F) -> Result<T, AwsAdapterError>
    where
        F: Future<Output = Result<T, AwsAdapterError>> + Send + 'static,
        T: Send + 'static,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| AwsAdapterError::Runtime("aws runtime closed".to_string()))?;
        block_on_with_runtime(runtime, future)
    }
}

impl Drop for AwsRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

// ============================================================================
// SECTION: Client Config
// ============================================================================

/// Region and endpoint overrides for the AWS clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsClientConfig {
    /// Region override; the default provider chain applies when unset.
    pub region: Option<String>,
    /// Endpoint override, for local emulators.
    pub endpoint: Option<String>,
    /// Upper bound on a single SDK operation, retries included.
    pub operation_timeout: Option<Duration>,
}

impl AwsClientConfig {
    /// Loads the shared SDK configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AwsAdapterError::Runtime`] when the runtime is unavailable.
    pub fn load(&self, runtime: &AwsRuntime) -> Result<SdkConfig, AwsAdapterError> {
        let region = self.region.clone();
        let endpoint = self.endpoint.clone();
        let timeouts = self.timeout_config();
        runtime.block_on(async move {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(timeouts) = timeouts {
                loader = loader.timeout_config(timeouts);
            }
            if let Some(region) = region {
                loader = loader.region(Region::new(region));
            }
            if let Some(endpoint) = endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            Ok(loader.load().await)
        })
    }

    /// Builds the SDK timeout settings; `None` keeps the SDK defaults.
    #[must_use]
    pub fn timeout_config(&self) -> Option<TimeoutConfig> {
        self.operation_timeout.map(|timeout| {
            TimeoutConfig::builder()
                .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
                .operation_timeout(timeout)
                .build()
        })
    }
}

// ============================================================================
// SECTION: Client Bundle
// ============================================================================

/// SDK clients built from one shared configuration.
pub struct AwsClients {
    /// Shared runtime.
    runtime: AwsRuntime,
    /// Loaded SDK configuration.
    sdk_config: SdkConfig,
}

impl AwsClients {
    /// Creates the runtime and loads SDK configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AwsAdapterError`] when the runtime or configuration fails.
    pub fn connect(config: &AwsClientConfig) -> Result<Self, AwsAdapterError> {
        let runtime = AwsRuntime::new()?;
        let sdk_config = config.load(&runtime)?;
        Ok(Self {
            runtime,
            sdk_config,
        })
    }

    /// Builds the Redshift Data API warehouse client.
    #[must_use]
    pub fn warehouse(&self) -> RedshiftDataClient {
        RedshiftDataClient::new(
            aws_sdk_redshiftdata::Client::new(&self.sdk_config),
            self.runtime.clone(),
        )
    }

    /// Builds the CloudWatch Logs record sink.
    #[must_use]
    pub fn record_sink(
        &self,
        destination: redshift_sre_core::LogDestination,
        create_if_missing: bool,
    ) -> CloudWatchLogsSink {
        CloudWatchLogsSink::new(
            aws_sdk_cloudwatchlogs::Client::new(&self.sdk_config),
            self.runtime.clone(),
            destination,
            create_if_missing,
        )
    }

    /// Builds the CloudWatch metrics sink.
    #[must_use]
    pub fn metrics_sink(&self) -> CloudWatchMetricsSink {
        CloudWatchMetricsSink::new(
            aws_sdk_cloudwatch::Client::new(&self.sdk_config),
            self.runtime.clone(),
        )
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
