//! Snapshot fixtures shared by unit and integration tests

use std::time::SystemTime;

use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::Temporality;

use crate::model::{
    DataPoint, Exemplar, Gauge, Histogram, HistogramDataPoint, Metric, MetricData,
    MetricSnapshot, Number, ScopeMetrics, Sum, Summary,
};

/// Resource with `service.name=test`
pub fn resource() -> Resource {
    Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", "test")])
        .build()
}

/// Scope `test-meter` at version `0.0.1`
pub fn scope() -> InstrumentationScope {
    InstrumentationScope::builder("test-meter")
        .with_version("0.0.1")
        .build()
}

/// Snapshot holding one metric under [`resource`] and [`scope`].
pub fn snapshot_of(name: &str, data: MetricData) -> MetricSnapshot {
    MetricSnapshot {
        resource: resource(),
        scope_metrics: vec![ScopeMetrics {
            scope: scope(),
            metrics: vec![Metric {
                name: name.to_string(),
                description: String::new(),
                unit: String::new(),
                data,
            }],
        }],
    }
}

pub fn exemplar<N: Number>(value: N) -> Exemplar<N> {
    Exemplar {
        filtered_attributes: vec![],
        time: SystemTime::now(),
        value,
        span_id: SpanId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8]),
        trace_id: TraceId::from_bytes([
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16,
        ]),
    }
}

fn data_point<N: Number>(value: N, time: SystemTime) -> DataPoint<N> {
    DataPoint {
        attributes: vec![],
        start_time: None,
        time,
        value,
        exemplars: vec![],
    }
}

/// Monotonic `metric_sum` with one point.
pub fn sum_snapshot(value: i64, time: SystemTime) -> MetricSnapshot {
    snapshot_of(
        "metric_sum",
        MetricData::SumI64(Sum {
            data_points: vec![data_point(value, time)],
            temporality: Temporality::Cumulative,
            is_monotonic: true,
        }),
    )
}

/// `metric_gauge` with one point.
pub fn gauge_snapshot(value: f64, time: SystemTime) -> MetricSnapshot {
    snapshot_of(
        "metric_gauge",
        MetricData::GaugeF64(Gauge {
            data_points: vec![data_point(value, time)],
        }),
    )
}

/// `metric_histogram` with bounds `[0, 5]`, bucket counts `[0, 1]` and the given summary values.
pub fn histogram_snapshot(
    count: u64,
    min: Option<i64>,
    max: Option<i64>,
    sum: i64,
    time: SystemTime,
) -> MetricSnapshot {
    snapshot_of(
        "metric_histogram",
        MetricData::HistogramI64(Histogram {
            data_points: vec![HistogramDataPoint {
                attributes: vec![],
                start_time: None,
                time,
                count,
                bounds: vec![0.0, 5.0],
                bucket_counts: vec![0, 1],
                min,
                max,
                sum,
                exemplars: vec![],
            }],
            temporality: Temporality::Cumulative,
        }),
    )
}

/// `metric_summary`, a payload the exporter cannot convert.
pub fn summary_snapshot() -> MetricSnapshot {
    snapshot_of(
        "metric_summary",
        MetricData::Summary(Summary {
            data_points: vec![],
        }),
    )
}
