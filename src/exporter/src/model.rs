//! Metric snapshot handed to the exporter once per collection cycle
//!
//! One [`MetricSnapshot`] is built per cycle from cumulative aggregations,
//! usually from the SDK's collected metrics (see [`crate::sdk`]). Attributes,
//! resource, scope and trace identifiers reuse the OpenTelemetry types.

use std::fmt;
use std::time::SystemTime;

use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::Temporality;

/// All metrics collected in one cycle, grouped by instrumentation scope
#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub resource: Resource,
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone)]
pub struct ScopeMetrics {
    pub scope: InstrumentationScope,
    pub metrics: Vec<Metric>,
}

/// One named measurement stream and its aggregated data
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub description: String,
    /// Empty when the instrument declared no unit
    pub unit: String,
    pub data: MetricData,
}

/// Aggregation payload of a metric.
///
/// `ExponentialHistogram`, `Summary` and `Unrecognized` can be produced by
/// the collector but have no remote_write mapping here; converting them
/// yields an error.
#[derive(Debug, Clone)]
pub enum MetricData {
    SumU64(Sum<u64>),
    SumI64(Sum<i64>),
    SumF64(Sum<f64>),
    GaugeU64(Gauge<u64>),
    GaugeI64(Gauge<i64>),
    GaugeF64(Gauge<f64>),
    HistogramU64(Histogram<u64>),
    HistogramI64(Histogram<i64>),
    HistogramF64(Histogram<f64>),
    ExponentialHistogram(ExponentialHistogram),
    Summary(Summary),
    /// An aggregation type this crate does not know
    Unrecognized,
}

impl MetricData {
    /// Name of the payload kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            MetricData::SumU64(_) => "Sum<u64>",
            MetricData::SumI64(_) => "Sum<i64>",
            MetricData::SumF64(_) => "Sum<f64>",
            MetricData::GaugeU64(_) => "Gauge<u64>",
            MetricData::GaugeI64(_) => "Gauge<i64>",
            MetricData::GaugeF64(_) => "Gauge<f64>",
            MetricData::HistogramU64(_) => "Histogram<u64>",
            MetricData::HistogramI64(_) => "Histogram<i64>",
            MetricData::HistogramF64(_) => "Histogram<f64>",
            MetricData::ExponentialHistogram(_) => "ExponentialHistogram",
            MetricData::Summary(_) => "Summary",
            MetricData::Unrecognized => "unrecognized",
        }
    }
}

/// Value types a data point can carry.
pub trait Number: Copy + fmt::Debug + PartialOrd + Send + Sync + 'static {
    /// Widen to the wire sample type.
    ///
    /// Integers beyond 2^53 lose precision.
    fn into_f64(self) -> f64;
}

impl Number for u64 {
    fn into_f64(self) -> f64 {
        self as f64
    }
}

impl Number for i64 {
    fn into_f64(self) -> f64 {
        self as f64
    }
}

impl Number for f64 {
    fn into_f64(self) -> f64 {
        self
    }
}

/// A sampled measurement linked to the trace that produced it
#[derive(Debug, Clone)]
pub struct Exemplar<N> {
    /// Attributes recorded with the measurement but dropped from the data
    /// point's attribute set by a view filter
    pub filtered_attributes: Vec<KeyValue>,
    pub time: SystemTime,
    pub value: N,
    pub span_id: SpanId,
    pub trace_id: TraceId,
}

#[derive(Debug, Clone)]
pub struct DataPoint<N> {
    pub attributes: Vec<KeyValue>,
    /// Start of the aggregation window; never used as the sample timestamp
    pub start_time: Option<SystemTime>,
    /// When the value was recorded
    pub time: SystemTime,
    pub value: N,
    pub exemplars: Vec<Exemplar<N>>,
}

#[derive(Debug, Clone)]
pub struct Sum<N> {
    pub data_points: Vec<DataPoint<N>>,
    pub temporality: Temporality,
    /// True for counters; only monotonic sums carry exemplars on the wire
    pub is_monotonic: bool,
}

#[derive(Debug, Clone)]
pub struct Gauge<N> {
    pub data_points: Vec<DataPoint<N>>,
}

#[derive(Debug, Clone)]
pub struct HistogramDataPoint<N> {
    pub attributes: Vec<KeyValue>,
    pub start_time: Option<SystemTime>,
    pub time: SystemTime,
    pub count: u64,
    /// Upper bounds of the buckets, in increasing order
    pub bounds: Vec<f64>,
    /// One count per bound. A trailing extra count is the overflow bucket.
    pub bucket_counts: Vec<u64>,
    pub min: Option<N>,
    pub max: Option<N>,
    pub sum: N,
    pub exemplars: Vec<Exemplar<N>>,
}

#[derive(Debug, Clone)]
pub struct Histogram<N> {
    pub data_points: Vec<HistogramDataPoint<N>>,
    pub temporality: Temporality,
}

#[derive(Debug, Clone)]
pub struct ExponentialBucket {
    pub offset: i32,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct ExponentialHistogramDataPoint {
    pub attributes: Vec<KeyValue>,
    pub time: SystemTime,
    pub count: u64,
    pub sum: f64,
    pub scale: i8,
    pub zero_count: u64,
    pub positive_bucket: ExponentialBucket,
    pub negative_bucket: ExponentialBucket,
}

#[derive(Debug, Clone)]
pub struct ExponentialHistogram {
    pub data_points: Vec<ExponentialHistogramDataPoint>,
    pub temporality: Temporality,
}

#[derive(Debug, Clone)]
pub struct QuantileValue {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct SummaryDataPoint {
    pub attributes: Vec<KeyValue>,
    pub time: SystemTime,
    pub count: u64,
    pub sum: f64,
    pub quantile_values: Vec<QuantileValue>,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub data_points: Vec<SummaryDataPoint>,
}
