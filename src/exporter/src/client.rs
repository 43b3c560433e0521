use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::config::ExporterConfig;
use common::prometheus::{
    CONTENT_ENCODING, CONTENT_TYPE, HEADER_REMOTE_WRITE_VERSION, REMOTE_WRITE_VERSION,
};
use reqwest::StatusCode;
use reqwest::header;
use tokio::sync::Mutex;

use crate::error::ExportError;

pub const USER_AGENT: &str = concat!("promwrite-exporter/", env!("CARGO_PKG_VERSION"));

/// Posts encoded remote_write bodies to one endpoint.
///
/// The pooled HTTP client sits behind a mutex so at most one send is in
/// flight. [`close`](Self::close) drops it for good, or marks it for the
/// in-flight send to drop when it finishes.
pub struct RemoteWriteClient {
    endpoint: String,
    token: String,
    timeout: Duration,
    http: Mutex<Option<reqwest::Client>>,
    closed: AtomicBool,
}

impl RemoteWriteClient {
    pub fn new(config: &ExporterConfig) -> Result<Self, ExportError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.remote_timeout)
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            timeout: config.remote_timeout,
            http: Mutex::new(Some(http)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and wait for the answer. Nothing is retried.
    pub async fn send(&self, body: Vec<u8>) -> Result<(), ExportError> {
        let mut guard = self.http.lock().await;
        if self.is_closed() {
            guard.take();
        }
        let Some(http) = guard.as_ref() else {
            return Err(ExportError::Shutdown);
        };

        let body_size = body.len();
        let request = build_request(http, &self.endpoint, &self.token, self.timeout, body)?;
        let result = http.execute(request).await;
        if self.is_closed() {
            guard.take();
        }
        let status = result?.status();

        tracing::debug!(
            endpoint = %self.endpoint,
            body_size,
            status = %status,
            "Sent remote write request"
        );

        if status != StatusCode::OK {
            return Err(ExportError::Status { status });
        }

        Ok(())
    }

    /// Drop the pooled client; later sends fail with [`ExportError::Shutdown`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Ok(mut http) = self.http.try_lock() {
            http.take();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// The remote_write POST with every required header set.
pub fn build_request(
    http: &reqwest::Client,
    endpoint: &str,
    token: &str,
    timeout: Duration,
    body: Vec<u8>,
) -> reqwest::Result<reqwest::Request> {
    http.post(endpoint)
        .header(header::CONTENT_ENCODING, CONTENT_ENCODING)
        .header(header::CONTENT_TYPE, CONTENT_TYPE)
        .header(HEADER_REMOTE_WRITE_VERSION, REMOTE_WRITE_VERSION)
        .header(header::USER_AGENT, USER_AGENT)
        .bearer_auth(token)
        .timeout(timeout)
        .body(body)
        .build()
}
