//! Prometheus remote_write wire format
//!
//! ## Protocol Details
//!
//! - Content-Type: `application/x-protobuf`
//! - Content-Encoding: `snappy` (block format, not framed)
//! - Version header: `X-Prometheus-Remote-Write-Version: 0.1.0`
//!
//! The body is a protobuf `WriteRequest` compressed as a single snappy block.

pub mod proto;

use prost::Message;

pub use proto::{Exemplar, Label, Sample, TimeSeries, WriteRequest};

/// Content type for Prometheus remote_write requests
pub const CONTENT_TYPE: &str = "application/x-protobuf";

/// Content encoding for Prometheus remote_write (snappy compression)
pub const CONTENT_ENCODING: &str = "snappy";

/// Header indicating remote_write protocol version
pub const HEADER_REMOTE_WRITE_VERSION: &str = "X-Prometheus-Remote-Write-Version";

/// The remote_write protocol version this crate speaks
pub const REMOTE_WRITE_VERSION: &str = "0.1.0";

/// Label carrying the metric name of a series
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Label carrying a classic histogram bucket's upper bound
pub const BUCKET_LABEL: &str = "le";

/// `le` value of the terminal histogram bucket
pub const INF_BUCKET: &str = "+Inf";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("protobuf encode failed: {0}")]
    Encode(#[from] prost::EncodeError),
    #[error("protobuf decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("snappy compression failed: {0}")]
    Snappy(#[from] snap::Error),
}

/// Serialize a WriteRequest and compress it into a remote_write body.
pub fn encode_write_request(request: &WriteRequest) -> Result<Vec<u8>, CodecError> {
    let mut message = Vec::with_capacity(request.encoded_len());
    request.encode(&mut message)?;

    let compressed = snap::raw::Encoder::new().compress_vec(&message)?;

    tracing::debug!(
        timeseries_count = request.timeseries.len(),
        encoded_size = message.len(),
        compressed_size = compressed.len(),
        "Encoded remote_write request"
    );

    Ok(compressed)
}

/// Decode a snappy-compressed protobuf WriteRequest from raw bytes.
pub fn decode_write_request(data: &[u8]) -> Result<WriteRequest, CodecError> {
    let decompressed = snap::raw::Decoder::new().decompress_vec(data)?;
    Ok(WriteRequest::decode(decompressed.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(name: &str, value: f64) -> TimeSeries {
        TimeSeries {
            labels: vec![
                Label::new(METRIC_NAME_LABEL, name),
                Label::new("job", "api"),
            ],
            samples: vec![Sample {
                value,
                timestamp: 1_700_000_000_000,
            }],
            exemplars: vec![Exemplar {
                labels: vec![Label::new("trace_id", "00000000000000000000000000000001")],
                value,
                timestamp: 1_700_000_000_000,
            }],
        }
    }

    #[test]
    fn test_encoded_body_is_snappy_block() {
        let request = WriteRequest {
            timeseries: vec![series("http_requests", 42.0)],
        };

        let body = encode_write_request(&request).unwrap();

        // Raw snappy blocks start with the varint uncompressed length, which
        // must equal the plain protobuf size.
        let expected_len = snap::raw::decompress_len(&body).unwrap();
        assert_eq!(expected_len, request.encoded_len());
    }

    #[test]
    fn test_decode_encoded_request() {
        let request = WriteRequest {
            timeseries: vec![series("http_requests", 42.0), series("temperature", 21.5)],
        };

        let decoded = decode_write_request(&encode_write_request(&request).unwrap()).unwrap();

        assert_eq!(decoded, request);
        assert_eq!(decoded.timeseries[1].metric_name(), Some("temperature"));
        assert_eq!(decoded.timeseries[0].label("job"), Some("api"));
    }

    #[test]
    fn test_empty_request_encodes() {
        let body = encode_write_request(&WriteRequest::default()).unwrap();
        let decoded = decode_write_request(&body).unwrap();
        assert!(decoded.timeseries.is_empty());
    }

    #[test]
    fn test_decode_rejects_unframed_garbage() {
        let err = decode_write_request(b"definitely not snappy").unwrap_err();
        assert!(matches!(err, CodecError::Snappy(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_protobuf() {
        let body = snap::raw::Encoder::new()
            .compress_vec(&[0xff, 0xff, 0xff])
            .unwrap();
        let err = decode_write_request(&body).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
