//! Snapshot → remote_write series conversion
//!
//! # Mapping Rules
//!
//! | Payload | Series per data point |
//! |---------|-----------------------|
//! | Sum | one, exemplars only when monotonic |
//! | Gauge | one, never exemplars |
//! | Histogram | `_max`, `_min` (when recorded), `_sum`, `_count`, one per bound with `le`, and `le="+Inf"` |
//! | ExponentialHistogram, Summary, unrecognized | none, reported as [`ConvertError`] |
//!
//! Every sample is stamped with the data point's recording time, never its
//! start time.

use std::time::{SystemTime, UNIX_EPOCH};

use common::config::ExporterConfig;
use common::prometheus::{
    BUCKET_LABEL, Exemplar as WireExemplar, INF_BUCKET, Sample, TimeSeries,
};

use crate::error::{ConversionErrors, ConvertError};
use crate::exemplars::project_exemplars;
use crate::labels::{LabelMap, data_point_labels, global_labels, overlay, scope_labels, to_wire_labels};
use crate::model::{Gauge, Histogram, MetricData, MetricSnapshot, Number, Sum};

const HISTOGRAM_SUM_SUFFIX: &str = "_sum";
const HISTOGRAM_MAX_SUFFIX: &str = "_max";
const HISTOGRAM_MIN_SUFFIX: &str = "_min";
const HISTOGRAM_COUNT_SUFFIX: &str = "_count";

/// Result of converting one snapshot: the series that converted plus an
/// error for every metric that did not.
#[derive(Debug, Default)]
pub struct Conversion {
    pub timeseries: Vec<TimeSeries>,
    pub errors: Vec<ConvertError>,
}

impl Conversion {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Split into the converted series and the aggregated error, if any.
    pub fn into_parts(self) -> (Vec<TimeSeries>, Option<ConversionErrors>) {
        let errors = (!self.errors.is_empty()).then(|| ConversionErrors(self.errors));
        (self.timeseries, errors)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeriesConverter {
    add_metric_suffixes: bool,
    external_labels: LabelMap,
}

impl SeriesConverter {
    pub fn new(add_metric_suffixes: bool, external_labels: LabelMap) -> Self {
        Self {
            add_metric_suffixes,
            external_labels,
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(config.add_metric_suffixes, config.external_labels.clone())
    }

    /// Convert every metric of the snapshot.
    ///
    /// Unsupported payloads do not stop the conversion; they are collected
    /// in [`Conversion::errors`] next to the series of the other metrics.
    pub fn convert(&self, snapshot: &MetricSnapshot) -> Conversion {
        let mut conversion = Conversion::default();
        let global = global_labels(&snapshot.resource, &self.external_labels);

        for scope_metrics in &snapshot.scope_metrics {
            let base = overlay(&global, &scope_labels(&scope_metrics.scope));

            for metric in &scope_metrics.metrics {
                let metric_name = self.metric_name(&metric.name, &metric.unit);

                let series = match &metric.data {
                    MetricData::SumU64(sum) => convert_sum(&metric_name, sum, &base),
                    MetricData::SumI64(sum) => convert_sum(&metric_name, sum, &base),
                    MetricData::SumF64(sum) => convert_sum(&metric_name, sum, &base),
                    MetricData::GaugeU64(gauge) => convert_gauge(&metric_name, gauge, &base),
                    MetricData::GaugeI64(gauge) => convert_gauge(&metric_name, gauge, &base),
                    MetricData::GaugeF64(gauge) => convert_gauge(&metric_name, gauge, &base),
                    MetricData::HistogramU64(histogram) => {
                        convert_histogram(&metric_name, histogram, &base)
                    }
                    MetricData::HistogramI64(histogram) => {
                        convert_histogram(&metric_name, histogram, &base)
                    }
                    MetricData::HistogramF64(histogram) => {
                        convert_histogram(&metric_name, histogram, &base)
                    }
                    MetricData::ExponentialHistogram(_)
                    | MetricData::Summary(_)
                    | MetricData::Unrecognized => {
                        let kind = metric.data.kind();
                        tracing::debug!(
                            metric = %metric.name,
                            kind,
                            "Skipping metric with unsupported aggregation"
                        );
                        conversion
                            .errors
                            .push(ConvertError::UnsupportedAggregation {
                                metric: metric.name.clone(),
                                kind,
                            });
                        continue;
                    }
                };

                conversion.timeseries.extend(series);
            }
        }

        tracing::debug!(
            timeseries_count = conversion.timeseries.len(),
            error_count = conversion.errors.len(),
            "Converted metric snapshot"
        );

        conversion
    }

    fn metric_name(&self, name: &str, unit: &str) -> String {
        if self.add_metric_suffixes && !unit.is_empty() {
            format!("{name}_{unit}")
        } else {
            name.to_string()
        }
    }
}

/// Milliseconds since the epoch, truncated. Times before the epoch are negative.
pub(crate) fn unix_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_millis() as i64,
        Err(before) => -(before.duration().as_millis() as i64),
    }
}

/// One series holding a single sample.
fn create_time_series(
    value: f64,
    time: SystemTime,
    labels: &LabelMap,
    exemplars: Vec<WireExemplar>,
) -> TimeSeries {
    TimeSeries {
        labels: to_wire_labels(labels),
        samples: vec![Sample {
            value,
            timestamp: unix_millis(time),
        }],
        exemplars,
    }
}

fn convert_sum<N: Number>(metric_name: &str, sum: &Sum<N>, base: &LabelMap) -> Vec<TimeSeries> {
    sum.data_points
        .iter()
        .map(|dp| {
            let labels = data_point_labels(metric_name, base, &dp.attributes);
            // Only counters carry exemplars in Prometheus
            let exemplars = if sum.is_monotonic {
                project_exemplars(&dp.exemplars)
            } else {
                Vec::new()
            };
            create_time_series(dp.value.into_f64(), dp.time, &labels, exemplars)
        })
        .collect()
}

fn convert_gauge<N: Number>(
    metric_name: &str,
    gauge: &Gauge<N>,
    base: &LabelMap,
) -> Vec<TimeSeries> {
    gauge
        .data_points
        .iter()
        .map(|dp| {
            let labels = data_point_labels(metric_name, base, &dp.attributes);
            create_time_series(dp.value.into_f64(), dp.time, &labels, Vec::new())
        })
        .collect()
}

fn convert_histogram<N: Number>(
    metric_name: &str,
    histogram: &Histogram<N>,
    base: &LabelMap,
) -> Vec<TimeSeries> {
    let mut result = Vec::new();

    for dp in &histogram.data_points {
        let exemplars = project_exemplars(&dp.exemplars);
        let labels_for = |suffix: &str| {
            data_point_labels(&format!("{metric_name}{suffix}"), base, &dp.attributes)
        };

        if let Some(max) = dp.max {
            result.push(create_time_series(
                max.into_f64(),
                dp.time,
                &labels_for(HISTOGRAM_MAX_SUFFIX),
                exemplars.clone(),
            ));
        }
        if let Some(min) = dp.min {
            result.push(create_time_series(
                min.into_f64(),
                dp.time,
                &labels_for(HISTOGRAM_MIN_SUFFIX),
                exemplars.clone(),
            ));
        }
        result.push(create_time_series(
            dp.sum.into_f64(),
            dp.time,
            &labels_for(HISTOGRAM_SUM_SUFFIX),
            exemplars.clone(),
        ));
        result.push(create_time_series(
            dp.count as f64,
            dp.time,
            &labels_for(HISTOGRAM_COUNT_SUFFIX),
            exemplars.clone(),
        ));

        // Bucket series carry the raw per-bucket count; the +Inf bucket
        // carries the sum of all counts of this data point, which may differ
        // from dp.count when the source is inconsistent.
        let mut bucket_labels = labels_for("");
        let mut total_count = 0u64;
        for (i, bucket_count) in dp.bucket_counts.iter().enumerate() {
            total_count = total_count.saturating_add(*bucket_count);
            let Some(bound) = dp.bounds.get(i) else {
                continue;
            };
            bucket_labels.insert(BUCKET_LABEL.to_string(), format_bound(*bound));
            result.push(create_time_series(
                *bucket_count as f64,
                dp.time,
                &bucket_labels,
                exemplars.clone(),
            ));
        }
        bucket_labels.insert(BUCKET_LABEL.to_string(), INF_BUCKET.to_string());
        result.push(create_time_series(
            total_count as f64,
            dp.time,
            &bucket_labels,
            exemplars,
        ));
    }

    result
}

/// Shortest decimal that round-trips, e.g. `5.0` → `"5"`, `0.25` → `"0.25"`.
fn format_bound(bound: f64) -> String {
    if bound == f64::INFINITY {
        INF_BUCKET.to_string()
    } else if bound == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        bound.to_string()
    }
}
