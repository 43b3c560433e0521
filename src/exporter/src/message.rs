use common::prometheus::{TimeSeries, WriteRequest, encode_write_request};

use crate::error::ExportError;

/// Wrap `timeseries` in a `WriteRequest`, then encode and compress it.
///
/// An empty slice still yields a valid (empty) request body.
pub fn build_message(timeseries: Vec<TimeSeries>) -> Result<Vec<u8>, ExportError> {
    let request = WriteRequest { timeseries };
    Ok(encode_write_request(&request)?)
}
