//! In-process remote_write receiver for end-to-end exporter tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use bytes::Bytes;
use common::config::ExporterConfig;
use common::prometheus::{WriteRequest, decode_write_request};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const WRITE_PATH: &str = "/api/v1/write";
pub const TEST_TOKEN: &str = "test-token";

/// One request as seen by the receiver
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub headers: HeaderMap,
    pub write_request: WriteRequest,
}

#[derive(Clone)]
struct ReceiverState {
    status: StatusCode,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// Remote write endpoint on an ephemeral local port.
///
/// Every request is counted; bodies that decode are recorded. The server
/// stops when the receiver is dropped.
pub struct RemoteWriteReceiver {
    addr: SocketAddr,
    state: ReceiverState,
    handle: JoinHandle<()>,
}

impl RemoteWriteReceiver {
    /// Receiver answering 200 OK.
    pub async fn start() -> Result<Self> {
        Self::with_status(StatusCode::OK).await
    }

    /// Receiver answering every request with `status`.
    pub async fn with_status(status: StatusCode) -> Result<Self> {
        let state = ReceiverState {
            status,
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new()
            .route(WRITE_PATH, post(receive))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Remote write receiver stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}{WRITE_PATH}", self.addr)
    }

    /// Exporter settings pointing at this receiver.
    pub fn exporter_config(&self) -> ExporterConfig {
        exporter_config(&self.endpoint())
    }

    /// Requests received so far, including ones that failed to decode.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.requests.lock().await.clone()
    }
}

impl Drop for RemoteWriteReceiver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn receive(State(state): State<ReceiverState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    state.hits.fetch_add(1, Ordering::SeqCst);

    match decode_write_request(&body) {
        Ok(write_request) => {
            tracing::debug!(
                timeseries_count = write_request.timeseries.len(),
                "Received remote write request"
            );
            state.requests.lock().await.push(ReceivedRequest {
                headers,
                write_request,
            });
            state.status
        }
        Err(e) => {
            tracing::warn!("Failed to decode remote write request: {e}");
            StatusCode::BAD_REQUEST
        }
    }
}

/// Exporter settings for `endpoint` with [`TEST_TOKEN`] and a short timeout.
pub fn exporter_config(endpoint: &str) -> ExporterConfig {
    ExporterConfig {
        endpoint: endpoint.to_string(),
        token: TEST_TOKEN.to_string(),
        remote_timeout: std::time::Duration::from_secs(5),
        ..Default::default()
    }
}

/// A local port nothing listens on.
pub async fn find_available_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Initialize tracing for tests
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("exporter=debug,tests_integration=debug,info")
        .with_test_writer()
        .try_init();
}
