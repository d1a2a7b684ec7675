#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sglang_lm::{ApiKey, BaseUrl, RetryConfig, SGLangModel, Sleeper, lm};
use wiremock::{Match, MockServer, Request as WiremockRequest};

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

#[derive(Clone)]
pub struct BodyContains(pub &'static str);

impl Match for BodyContains {
    fn matches(&self, request: &WiremockRequest) -> bool {
        std::str::from_utf8(&request.body)
            .map(|body| body.contains(self.0))
            .unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct BodyNotContains(pub &'static str);

impl Match for BodyNotContains {
    fn matches(&self, request: &WiremockRequest) -> bool {
        !BodyContains(self.0).matches(request)
    }
}

/// Shared buffer the fmt subscriber writes formatted events into.
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

/// Capture WARN and above on the current thread until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

pub fn model_for(
    server: &MockServer,
    model_id: &str,
    retry: RetryConfig,
) -> (SGLangModel, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let model = lm::model(model_id)
        .base_url(BaseUrl::Custom(format!("{}/v1", server.uri())))
        .api_key(ApiKey::None)
        .retry_config(retry)
        .sleeper(sleeper.clone())
        .build()
        .expect("model should build");
    (model, sleeper)
}

pub async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("mock server should record requests")
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("JSON body"))
        .collect()
}
