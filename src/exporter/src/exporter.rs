use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::config::ExporterConfig;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::metrics::data::ResourceMetrics;
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::{Aggregation, InstrumentKind, PeriodicReader, Temporality};
use tokio::runtime::Handle;

use crate::client::RemoteWriteClient;
use crate::convert::{Conversion, SeriesConverter};
use crate::error::ExportError;
use crate::message::build_message;
use crate::model::MetricSnapshot;

/// Pushes cumulative snapshots to a Prometheus remote_write endpoint.
///
/// Requests run on the tokio runtime captured at construction, so the SDK's
/// periodic reader can drive the exporter from its own thread.
pub struct RemoteWriteExporter {
    converter: SeriesConverter,
    client: Arc<RemoteWriteClient>,
    runtime: Handle,
    is_shutdown: AtomicBool,
}

impl RemoteWriteExporter {
    /// Build an exporter from a configuration that already passed
    /// [`ExporterConfig::validate`]. Must be called inside a tokio runtime.
    pub fn new(config: &ExporterConfig) -> Result<Self, ExportError> {
        Self::with_runtime(config, Handle::try_current()?)
    }

    pub fn with_runtime(config: &ExporterConfig, runtime: Handle) -> Result<Self, ExportError> {
        Ok(Self {
            converter: SeriesConverter::from_config(config),
            client: Arc::new(RemoteWriteClient::new(config)?),
            runtime,
            is_shutdown: AtomicBool::new(false),
        })
    }

    /// A periodic reader that collects every `push_interval` and exports
    /// through a new exporter.
    pub fn periodic_reader(config: &ExporterConfig) -> Result<PeriodicReader<Self>, ExportError> {
        Ok(PeriodicReader::builder(Self::new(config)?)
            .with_interval(config.push_interval)
            .build())
    }

    /// Convert a snapshot without sending it.
    pub fn convert(&self, snapshot: &MetricSnapshot) -> Conversion {
        self.converter.convert(snapshot)
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Convert, encode and send one snapshot.
    ///
    /// Series that converted are sent even when some metrics did not; the
    /// conversion error is returned after a successful send. A failed send
    /// takes precedence over conversion errors.
    pub async fn export_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), ExportError> {
        if self.is_shutdown() {
            return Err(ExportError::Shutdown);
        }

        let (timeseries, conversion_errors) = self.convert(snapshot).into_parts();
        let series_count = timeseries.len();
        let body = build_message(timeseries)?;

        let client = self.client.clone();
        self.runtime
            .spawn(async move { client.send(body).await })
            .await??;

        tracing::debug!(series_count, "Exported metric snapshot");

        match conversion_errors {
            Some(errors) => Err(errors.into()),
            None => Ok(()),
        }
    }

    /// Aggregation is left to the meter provider's views.
    pub fn aggregation(&self, _kind: InstrumentKind) -> Aggregation {
        Aggregation::Default
    }

    fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::Acquire)
    }
}

impl PushMetricExporter for RemoteWriteExporter {
    async fn export(&self, metrics: &mut ResourceMetrics) -> OTelSdkResult {
        let snapshot = MetricSnapshot::from(&*metrics);
        self.export_snapshot(&snapshot).await.map_err(Into::into)
    }

    /// Nothing is buffered between exports.
    fn force_flush(&self) -> OTelSdkResult {
        if self.is_shutdown() {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        Ok(())
    }

    /// Release the connection pool. Only the first call succeeds.
    fn shutdown(&self) -> OTelSdkResult {
        if self.is_shutdown.swap(true, Ordering::AcqRel) {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        self.client.close();
        tracing::debug!(endpoint = %self.client.endpoint(), "Remote write exporter shut down");
        Ok(())
    }

    fn temporality(&self) -> Temporality {
        Temporality::Cumulative
    }
}
