use std::fmt;

use common::prometheus::CodecError;
use opentelemetry_sdk::error::OTelSdkError;

/// A metric that could not be turned into series
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("unsupported metric type {kind} for metric {metric:?}")]
    UnsupportedAggregation { metric: String, kind: &'static str },
}

/// Every [`ConvertError`] hit while converting one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionErrors(pub Vec<ConvertError>);

impl ConversionErrors {
    pub fn errors(&self) -> &[ConvertError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConversionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "1 error occurred:\n\t* {single}"),
            errors => {
                write!(f, "{} errors occurred:", errors.len())?;
                for error in errors {
                    write!(f, "\n\t* {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConversionErrors {}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Some metrics were skipped; the rest were still exported
    #[error("partial conversion: {0}")]
    Conversion(#[from] ConversionErrors),
    #[error("failed to build remote write message: {0}")]
    Message(#[from] CodecError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The endpoint answered with something other than 200 OK
    #[error("remote write failed: {status}")]
    Status { status: reqwest::StatusCode },
    #[error("remote write exporter is shut down")]
    Shutdown,
    /// Built outside a tokio runtime
    #[error("no tokio runtime to send requests on: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
    #[error("send task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<ExportError> for OTelSdkError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Shutdown => OTelSdkError::AlreadyShutdown,
            other => OTelSdkError::InternalFailure(other.to_string()),
        }
    }
}
