//! Protobuf wire format types for the Prometheus remote_write 1.0 protocol
//!
//! Only the messages the exporter writes are modelled. Native histograms and
//! metric metadata are not produced, so their fields are left out; decoders
//! skip unknown fields, which keeps payloads from newer senders readable.
//!
//! Reference: https://github.com/prometheus/prometheus/blob/main/prompb/types.proto

use prost::Message;

/// Top-level envelope of one remote_write POST body
#[derive(Clone, PartialEq, Message)]
pub struct WriteRequest {
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

/// One series: its identifying labels, samples and exemplars
#[derive(Clone, PartialEq, Message)]
pub struct TimeSeries {
    /// Sorted by name; must contain `__name__`
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
    #[prost(message, repeated, tag = "3")]
    pub exemplars: Vec<Exemplar>,
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// A sample value with its timestamp in milliseconds since the epoch
#[derive(Clone, PartialEq, Message)]
pub struct Sample {
    #[prost(double, tag = "1")]
    pub value: f64,
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

/// Exemplar for trace correlation
#[derive(Clone, PartialEq, Message)]
pub struct Exemplar {
    /// Carries `trace_id` / `span_id` plus any filtered attributes
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl TimeSeries {
    /// Value of the label with the given name, if present
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// The `__name__` label value
    pub fn metric_name(&self) -> Option<&str> {
        self.label(super::METRIC_NAME_LABEL)
    }
}
