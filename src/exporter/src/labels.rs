//! Label sets for remote_write series
//!
//! Labels come from four places, in increasing precedence:
//!
//! 1. resource attributes, then the configured external labels
//! 2. instrumentation scope (`otel_scope_name`, `otel_scope_version`, scope attributes)
//! 3. the `__name__` label
//! 4. data point attributes
//!
//! Every merge returns a new map; nothing is shared between series.

use std::collections::BTreeMap;

use common::prometheus::{Label, METRIC_NAME_LABEL};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_sdk::Resource;

/// Label name → value, before sanitization
pub type LabelMap = BTreeMap<String, String>;

pub const SCOPE_NAME_LABEL: &str = "otel_scope_name";
pub const SCOPE_VERSION_LABEL: &str = "otel_scope_version";

/// Right-biased merge: every entry of `base` not in `overlay`, plus all of `overlay`.
pub fn overlay(base: &LabelMap, overlay: &LabelMap) -> LabelMap {
    let mut merged = base.clone();
    merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Resource attributes overlaid with the exporter's external labels.
pub fn global_labels(resource: &Resource, external_labels: &LabelMap) -> LabelMap {
    let resource_labels: LabelMap = resource
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), value.as_str().into_owned()))
        .collect();
    overlay(&resource_labels, external_labels)
}

/// Scope identity and attributes. The version label is emitted even when empty.
pub fn scope_labels(scope: &InstrumentationScope) -> LabelMap {
    let mut labels = LabelMap::new();
    labels.insert(SCOPE_NAME_LABEL.to_string(), scope.name().to_string());
    labels.insert(
        SCOPE_VERSION_LABEL.to_string(),
        scope.version().unwrap_or_default().to_string(),
    );
    overlay(&labels, &attribute_labels(scope.attributes()))
}

pub fn attribute_labels<'a>(attributes: impl IntoIterator<Item = &'a KeyValue>) -> LabelMap {
    attributes
        .into_iter()
        .map(|kv| (kv.key.as_str().to_string(), kv.value.as_str().into_owned()))
        .collect()
}

/// Labels of one series: `base`, then `__name__`, then the point's attributes.
pub fn data_point_labels(metric_name: &str, base: &LabelMap, attributes: &[KeyValue]) -> LabelMap {
    let mut labels = base.clone();
    labels.insert(METRIC_NAME_LABEL.to_string(), metric_name.to_string());
    overlay(&labels, &attribute_labels(attributes))
}

/// Make `name` a valid Prometheus label name.
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a leading digit gets a `key_` prefix.
pub fn sanitize_label_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len() + 4);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.push_str("key_");
    }
    sanitized.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    sanitized
}

/// Sanitize names and emit wire labels sorted by name.
///
/// When two names sanitize to the same label, the one sorting last in `labels` wins.
pub fn to_wire_labels(labels: &LabelMap) -> Vec<Label> {
    let sanitized: LabelMap = labels
        .iter()
        .map(|(name, value)| (sanitize_label_name(name), value.clone()))
        .filter(|(name, _)| !name.is_empty())
        .collect();

    sanitized
        .into_iter()
        .map(|(name, value)| Label { name, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Value;

    fn map(entries: &[(&str, &str)]) -> LabelMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overlay_is_right_biased_merge() {
        let cases = [
            (map(&[]), map(&[])),
            (map(&[("a", "1")]), map(&[])),
            (map(&[]), map(&[("a", "1")])),
            (map(&[("a", "1"), ("b", "2")]), map(&[("b", "3"), ("c", "4")])),
            (map(&[("x", "base")]), map(&[("x", "over")])),
        ];

        for (a, b) in cases {
            let mut expected = LabelMap::new();
            for (k, v) in &a {
                if !b.contains_key(k) {
                    expected.insert(k.clone(), v.clone());
                }
            }
            for (k, v) in &b {
                expected.insert(k.clone(), v.clone());
            }

            let merged = overlay(&a, &b);
            assert_eq!(merged, expected);
            // inputs untouched, result stable
            assert_eq!(overlay(&a, &b), merged);
        }
    }

    #[test]
    fn test_global_labels_external_wins() {
        let resource = Resource::builder_empty()
            .with_attributes([
                KeyValue::new("service.name", "test"),
                KeyValue::new("env", "dev"),
                KeyValue::new("replicas", 3_i64),
            ])
            .build();
        let external = map(&[("env", "prod"), ("region", "eu")]);

        let labels = global_labels(&resource, &external);

        assert_eq!(
            labels,
            map(&[
                ("service.name", "test"),
                ("env", "prod"),
                ("region", "eu"),
                ("replicas", "3"),
            ])
        );
    }

    #[test]
    fn test_scope_labels_always_carry_version() {
        let scope = InstrumentationScope::builder("test-meter").build();
        let labels = scope_labels(&scope);
        assert_eq!(
            labels,
            map(&[(SCOPE_NAME_LABEL, "test-meter"), (SCOPE_VERSION_LABEL, "")])
        );

        let scope = InstrumentationScope::builder("test-meter")
            .with_version("0.0.1")
            .with_attributes([KeyValue::new("team", "core")])
            .build();
        let labels = scope_labels(&scope);
        assert_eq!(labels.get(SCOPE_VERSION_LABEL).map(String::as_str), Some("0.0.1"));
        assert_eq!(labels.get("team").map(String::as_str), Some("core"));
    }

    #[test]
    fn test_data_point_attributes_win() {
        let base = map(&[("service.name", "test"), ("host", "a")]);
        let attrs = [
            KeyValue::new("host", "b"),
            KeyValue::new("__name__", "hijacked"),
            KeyValue::new("ok", true),
        ];

        let labels = data_point_labels("metric_sum", &base, &attrs);

        assert_eq!(labels.get("host").map(String::as_str), Some("b"));
        assert_eq!(labels.get("__name__").map(String::as_str), Some("hijacked"));
        assert_eq!(labels.get("ok").map(String::as_str), Some("true"));
        // base not mutated
        assert_eq!(base.get("host").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_attribute_values_render_as_strings() {
        let attrs = [
            KeyValue::new("f", 1.5_f64),
            KeyValue::new("i", -7_i64),
            KeyValue::new("s", "x"),
            KeyValue::new("arr", Value::Array(vec![1i64, 2].into())),
        ];
        let labels = attribute_labels(&attrs);
        assert_eq!(labels["f"], "1.5");
        assert_eq!(labels["i"], "-7");
        assert_eq!(labels["s"], "x");
        assert!(!labels["arr"].is_empty());
    }

    #[test]
    fn test_sanitize_label_name() {
        assert_eq!(sanitize_label_name("service.name"), "service_name");
        assert_eq!(sanitize_label_name("__name__"), "__name__");
        assert_eq!(sanitize_label_name("http-method"), "http_method");
        assert_eq!(sanitize_label_name("9lives"), "key_9lives");
        assert_eq!(sanitize_label_name("ünïcode"), "_n_code");
        assert_eq!(sanitize_label_name("ok_Name9"), "ok_Name9");
        assert_eq!(sanitize_label_name(""), "");
    }

    #[test]
    fn test_wire_labels_sorted_and_unique() {
        let labels = map(&[
            ("service.name", "test"),
            ("__name__", "metric_sum"),
            ("otel_scope_name", "test-meter"),
            ("", "dropped"),
        ]);

        let wire = to_wire_labels(&labels);
        let names: Vec<&str> = wire.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["__name__", "otel_scope_name", "service_name"]);

        // "a.b" and "a_b" collide after sanitization; only one survives
        let wire = to_wire_labels(&map(&[("a.b", "dot"), ("a_b", "underscore")]));
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].name, "a_b");
    }
}
