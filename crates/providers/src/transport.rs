//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use multiflow_core::error::ProviderError;
use multiflow_core::provider::{Method, Transport, TransportRequest, TransportResponse};
use multiflow_core::ProviderId;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends provider requests over HTTPS.
///
/// One client is shared by every adapter, so connection pools are reused
/// across stages and runs.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to a default HTTP client");
                reqwest::Client::new()
            });
        Self { client }
    }

    pub fn from_secs(timeout_secs: u64) -> Self {
        Self::new(Duration::from_secs(timeout_secs))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::from_secs(120)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        provider: ProviderId,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, ProviderError> {
        let network = |e: reqwest::Error| ProviderError::Network {
            provider,
            message: e.to_string(),
        };

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.endpoint),
            Method::Post => self.client.post(&request.endpoint).json(&request.body),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(provider = %provider, method = ?request.method, "Sending provider request");

        let response = builder.send().await.map_err(network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network)?;

        debug!(provider = %provider, status, bytes = body.len(), "Provider responded");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_builds() {
        let transport = HttpTransport::default();
        let _ = format!("{transport:?}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let transport = HttpTransport::from_secs(2);
        let request =
            TransportRequest::post_json("http://127.0.0.1:9/v1/chat", serde_json::json!({}));
        let err = transport.send(ProviderId::Grok, request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network { provider: ProviderId::Grok, .. }));
        assert!(err.to_string().starts_with("xAI request failed"));
    }
}
