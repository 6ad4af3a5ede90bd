use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Status and raw body of one results page; decoding is the fetcher's job.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure: timeout, DNS, reset. No HTTP status was received.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// One POST to the results endpoint carrying the bearer credential.
#[async_trait]
pub trait ResultsTransport: Send + Sync {
    async fn post_page(&self, payload: &Value) -> Result<TransportResponse, TransportError>;
}
