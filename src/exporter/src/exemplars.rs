use common::prometheus::Exemplar as WireExemplar;

use crate::convert::unix_millis;
use crate::labels::{LabelMap, attribute_labels, overlay, to_wire_labels};
use crate::model::{Exemplar, Number};

pub const TRACE_ID_LABEL: &str = "trace_id";
pub const SPAN_ID_LABEL: &str = "span_id";

/// Map sampled exemplars to their wire form.
///
/// Trace and span ids become lowercase hex labels; filtered attributes are
/// added next to them and win on a name clash.
pub fn project_exemplars<N: Number>(exemplars: &[Exemplar<N>]) -> Vec<WireExemplar> {
    exemplars
        .iter()
        .map(|exemplar| {
            let mut ids = LabelMap::new();
            ids.insert(
                TRACE_ID_LABEL.to_string(),
                hex::encode(exemplar.trace_id.to_bytes()),
            );
            ids.insert(
                SPAN_ID_LABEL.to_string(),
                hex::encode(exemplar.span_id.to_bytes()),
            );
            let labels = overlay(&ids, &attribute_labels(&exemplar.filtered_attributes));

            WireExemplar {
                labels: to_wire_labels(&labels),
                value: exemplar.value.into_f64(),
                timestamp: unix_millis(exemplar.time),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::KeyValue;
    use opentelemetry::trace::{SpanId, TraceId};
    use std::time::{Duration, UNIX_EPOCH};

    fn exemplar(value: i64, attrs: Vec<KeyValue>) -> Exemplar<i64> {
        Exemplar {
            filtered_attributes: attrs,
            time: UNIX_EPOCH + Duration::from_nanos(1_700_000_000_123_999_999),
            value,
            span_id: SpanId::from_bytes([0x00, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0xff]),
            trace_id: TraceId::from_bytes([
                0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x01,
            ]),
        }
    }

    #[test]
    fn test_ids_rendered_as_lowercase_hex() {
        let projected = project_exemplars(&[exemplar(7, vec![])]);

        assert_eq!(projected.len(), 1);
        let labels = &projected[0].labels;
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name, SPAN_ID_LABEL);
        assert_eq!(labels[0].value, "000a0b0c0d0e0fff");
        assert_eq!(labels[1].name, TRACE_ID_LABEL);
        assert_eq!(labels[1].value, "abcdef01234567890000000000000001");
    }

    #[test]
    fn test_value_and_truncated_timestamp() {
        let projected = project_exemplars(&[exemplar(7, vec![])]);
        assert_eq!(projected[0].value, 7.0);
        // 1_700_000_000_123.999999 ms truncates, never rounds
        assert_eq!(projected[0].timestamp, 1_700_000_000_123);
    }

    #[test]
    fn test_filtered_attributes_are_labels() {
        let projected = project_exemplars(&[
            exemplar(1, vec![KeyValue::new("http.route", "/users")]),
            exemplar(2, vec![]),
        ]);

        assert_eq!(projected.len(), 2);
        let first: Vec<(&str, &str)> = projected[0]
            .labels
            .iter()
            .map(|l| (l.name.as_str(), l.value.as_str()))
            .collect();
        assert!(first.contains(&("http_route", "/users")));

        // attributes of one exemplar never leak into the next
        assert_eq!(projected[1].labels.len(), 2);
    }

    #[test]
    fn test_filtered_attribute_overrides_id_label() {
        let projected = project_exemplars(&[exemplar(
            1,
            vec![KeyValue::new("trace_id", "from-attributes")],
        )]);

        let labels = &projected[0].labels;
        assert_eq!(labels.len(), 2);
        let trace_ids: Vec<&str> = labels
            .iter()
            .filter(|l| l.name == TRACE_ID_LABEL)
            .map(|l| l.value.as_str())
            .collect();
        assert_eq!(trace_ids, ["from-attributes"]);
        assert_eq!(labels[0].value, "000a0b0c0d0e0fff");
    }

    #[test]
    fn test_no_exemplars() {
        let projected = project_exemplars::<f64>(&[]);
        assert!(projected.is_empty());
    }
}
