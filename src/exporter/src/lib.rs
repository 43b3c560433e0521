//! OpenTelemetry metrics → Prometheus remote_write exporter
//!
//! A [`MetricSnapshot`] collected from cumulative aggregations is converted to
//! remote_write time series ([`convert`]), wrapped in a snappy-compressed
//! `WriteRequest` ([`message`]) and posted to the configured endpoint
//! ([`client`]). [`RemoteWriteExporter`] ties the steps together and plugs
//! into an OpenTelemetry SDK meter provider as a [`PushMetricExporter`];
//! [`sdk`] maps the SDK's collected metrics into snapshots.

pub mod client;
pub mod convert;
pub mod error;
pub mod exemplars;
pub mod exporter;
pub mod labels;
pub mod message;
pub mod model;
pub mod sdk;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use convert::{Conversion, SeriesConverter};
pub use error::{ConversionErrors, ConvertError, ExportError};
pub use exporter::RemoteWriteExporter;
pub use model::MetricSnapshot;
pub use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
