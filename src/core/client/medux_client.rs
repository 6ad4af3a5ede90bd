use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::results_transport::{ResultsTransport, TransportError, TransportResponse};
use crate::core::config::credentials::BearerToken;

/// reqwest-backed transport for the Medux results endpoint.
pub struct MeduxClient {
    client: Client,
    url: String,
    token: BearerToken,
}

impl MeduxClient {
    pub fn new(url: impl Into<String>, token: BearerToken, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self::with_client(client, url, token))
    }

    pub fn with_client(client: Client, url: impl Into<String>, token: BearerToken) -> Self {
        Self {
            client,
            url: url.into(),
            token,
        }
    }
}

#[async_trait]
impl ResultsTransport for MeduxClient {
    async fn post_page(&self, payload: &Value) -> Result<TransportResponse, TransportError> {
        debug!(url = %self.url, token = %self.token.masked(), "POST results page");

        // `.json()` also sets Content-Type: application/json
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(self.token.expose())
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError(format!("request to {} failed: {}", self.url, e)))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {}", e)))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_echo_server() -> String {
        async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            };
            Json(json!({
                "authorization": header("authorization"),
                "content_type": header("content-type"),
                "body": body,
            }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/results", post(echo));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/results", addr)
    }

    #[tokio::test]
    async fn sends_bearer_token_and_json_body() {
        let url = spawn_echo_server().await;
        let client = MeduxClient::new(url, BearerToken::new("secret-token"), Duration::from_secs(5)).unwrap();

        let resp = client
            .post_page(&json!({ "tsStart": 1, "tsEnd": 2, "format": "raw" }))
            .await
            .expect("local server should answer");

        assert!(resp.is_success());
        let echoed: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(echoed["authorization"], "Bearer secret-token");
        assert_eq!(echoed["content_type"], "application/json");
        assert_eq!(echoed["body"]["format"], "raw");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = MeduxClient::new(
            format!("http://{}/api/results", addr),
            BearerToken::new("t"),
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(client.post_page(&json!({})).await.is_err());
    }
}
