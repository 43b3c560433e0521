//! Snapshots from OpenTelemetry SDK collections
//!
//! The SDK hands readers type-erased aggregations. Each one is downcast to
//! the concrete sum, gauge or histogram it holds; anything else becomes
//! [`MetricData::Unrecognized`] and is reported by the converter.
//!
//! SDK data points carry no timestamps of their own; every point takes the
//! `time` and `start_time` of its aggregation.

use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry_sdk::metrics::data;

use crate::model::{
    DataPoint, Exemplar, ExponentialBucket, ExponentialHistogram, ExponentialHistogramDataPoint,
    Gauge, Histogram, HistogramDataPoint, Metric, MetricData, MetricSnapshot, Number,
    ScopeMetrics, Sum,
};

impl From<&data::ResourceMetrics> for MetricSnapshot {
    fn from(metrics: &data::ResourceMetrics) -> Self {
        MetricSnapshot {
            resource: metrics.resource.clone(),
            scope_metrics: metrics
                .scope_metrics
                .iter()
                .map(|scope_metrics| ScopeMetrics {
                    scope: scope_metrics.scope.clone(),
                    metrics: scope_metrics.metrics.iter().map(metric).collect(),
                })
                .collect(),
        }
    }
}

fn metric(metric: &data::Metric) -> Metric {
    Metric {
        name: metric.name.to_string(),
        description: metric.description.to_string(),
        unit: metric.unit.to_string(),
        data: metric_data(metric.data.as_ref()),
    }
}

fn metric_data(aggregation: &dyn data::Aggregation) -> MetricData {
    let any = aggregation.as_any();

    if let Some(s) = any.downcast_ref::<data::Sum<u64>>() {
        return MetricData::SumU64(sum(s));
    }
    if let Some(s) = any.downcast_ref::<data::Sum<i64>>() {
        return MetricData::SumI64(sum(s));
    }
    if let Some(s) = any.downcast_ref::<data::Sum<f64>>() {
        return MetricData::SumF64(sum(s));
    }
    if let Some(g) = any.downcast_ref::<data::Gauge<u64>>() {
        return MetricData::GaugeU64(gauge(g));
    }
    if let Some(g) = any.downcast_ref::<data::Gauge<i64>>() {
        return MetricData::GaugeI64(gauge(g));
    }
    if let Some(g) = any.downcast_ref::<data::Gauge<f64>>() {
        return MetricData::GaugeF64(gauge(g));
    }
    if let Some(h) = any.downcast_ref::<data::Histogram<u64>>() {
        return MetricData::HistogramU64(histogram(h));
    }
    if let Some(h) = any.downcast_ref::<data::Histogram<i64>>() {
        return MetricData::HistogramI64(histogram(h));
    }
    if let Some(h) = any.downcast_ref::<data::Histogram<f64>>() {
        return MetricData::HistogramF64(histogram(h));
    }
    if let Some(h) = any.downcast_ref::<data::ExponentialHistogram<u64>>() {
        return MetricData::ExponentialHistogram(exponential_histogram(h));
    }
    if let Some(h) = any.downcast_ref::<data::ExponentialHistogram<i64>>() {
        return MetricData::ExponentialHistogram(exponential_histogram(h));
    }
    if let Some(h) = any.downcast_ref::<data::ExponentialHistogram<f64>>() {
        return MetricData::ExponentialHistogram(exponential_histogram(h));
    }

    MetricData::Unrecognized
}

fn exemplars<N: Number>(exemplars: &[data::Exemplar<N>]) -> Vec<Exemplar<N>> {
    exemplars
        .iter()
        .map(|e| Exemplar {
            filtered_attributes: e.filtered_attributes.clone(),
            time: e.time,
            value: e.value,
            span_id: SpanId::from_bytes(e.span_id),
            trace_id: TraceId::from_bytes(e.trace_id),
        })
        .collect()
}

fn sum<N: Number>(sum: &data::Sum<N>) -> Sum<N> {
    Sum {
        data_points: sum
            .data_points
            .iter()
            .map(|dp| DataPoint {
                attributes: dp.attributes.clone(),
                start_time: Some(sum.start_time),
                time: sum.time,
                value: dp.value,
                exemplars: exemplars(&dp.exemplars),
            })
            .collect(),
        temporality: sum.temporality,
        is_monotonic: sum.is_monotonic,
    }
}

fn gauge<N: Number>(gauge: &data::Gauge<N>) -> Gauge<N> {
    Gauge {
        data_points: gauge
            .data_points
            .iter()
            .map(|dp| DataPoint {
                attributes: dp.attributes.clone(),
                start_time: gauge.start_time,
                time: gauge.time,
                value: dp.value,
                exemplars: exemplars(&dp.exemplars),
            })
            .collect(),
    }
}

fn histogram<N: Number>(histogram: &data::Histogram<N>) -> Histogram<N> {
    Histogram {
        data_points: histogram
            .data_points
            .iter()
            .map(|dp| HistogramDataPoint {
                attributes: dp.attributes.clone(),
                start_time: Some(histogram.start_time),
                time: histogram.time,
                count: dp.count,
                bounds: dp.bounds.clone(),
                bucket_counts: dp.bucket_counts.clone(),
                min: dp.min,
                max: dp.max,
                sum: dp.sum,
                exemplars: exemplars(&dp.exemplars),
            })
            .collect(),
        temporality: histogram.temporality,
    }
}

fn exponential_histogram<N: Number>(
    histogram: &data::ExponentialHistogram<N>,
) -> ExponentialHistogram {
    let bucket = |b: &data::ExponentialBucket| ExponentialBucket {
        offset: b.offset,
        counts: b.counts.clone(),
    };
    ExponentialHistogram {
        data_points: histogram
            .data_points
            .iter()
            .map(|dp| ExponentialHistogramDataPoint {
                attributes: dp.attributes.clone(),
                time: histogram.time,
                count: dp.count as u64,
                sum: dp.sum.into_f64(),
                scale: dp.scale,
                zero_count: dp.zero_count,
                positive_bucket: bucket(&dp.positive_bucket),
                negative_bucket: bucket(&dp.negative_bucket),
            })
            .collect(),
        temporality: histogram.temporality,
    }
}
