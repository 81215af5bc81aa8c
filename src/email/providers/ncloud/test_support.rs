use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;

use super::transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, TransportError};

/// What the mock saw for each call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: &'static str,
    pub timestamp: i64,
    pub signature: String,
    pub json: Option<serde_json::Value>,
    pub filename: Option<String>,
}

/// Replays queued outcomes in order and records every request.
#[derive(Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.into(),
        }));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let (json, filename) = match request.body {
            RequestBody::Json(json) => (Some(json), None),
            RequestBody::File { filename, .. } => (None, Some(filename)),
        };
        self.calls.lock().unwrap().push(RecordedCall {
            path: request.signed.path,
            timestamp: request.signed.timestamp,
            signature: request.signed.signature,
            json,
            filename,
        });

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no response queued".to_string())))
    }
}

pub fn upload_ok(file_id: &str) -> String {
    serde_json::json!({
        "tempRequestId": "temp-1",
        "files": [{"fileName": "f", "fileSize": 1, "fileId": file_id}]
    })
    .to_string()
}

pub fn send_ok(request_id: &str, count: u32) -> String {
    serde_json::json!({"requestId": request_id, "count": count}).to_string()
}

/// Log output captured by [`capture_logs`].
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes this thread's events into a buffer until the guard is dropped.
/// Use from a current-thread runtime so the whole send stays on one thread.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}
