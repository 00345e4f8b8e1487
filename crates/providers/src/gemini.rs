//! Google Gemini `generateContent` adapter. Runs the draft stage.
//!
//! The API key travels as a `key` query parameter; there is no auth header.

use async_trait::async_trait;
use multiflow_core::error::ProviderError;
use multiflow_core::message::ChatRequest;
use multiflow_core::provider::*;
use multiflow_core::ProviderId;
use std::sync::Arc;
use tracing::debug;

use crate::prompts;
use crate::response;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini draft writer.
pub struct GeminiAdapter {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    base_url: String,
    model: String,
    empty_answer: String,
}

impl GeminiAdapter {
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: prompts::default_model(ProviderId::Gemini).into(),
            empty_answer: "Empty answer".into(),
        }
    }

    /// Models collection URL; the model name and method are appended.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_empty_answer(mut self, empty_answer: impl Into<String>) -> Self {
        self.empty_answer = empty_answer.into();
        self
    }

    /// `{base}/{model}:generateContent?key={key}` with the key URL-encoded.
    fn endpoint(&self, key: &str) -> std::result::Result<String, ProviderError> {
        let raw = format!("{}/{}:generateContent", self.base_url, self.model);
        reqwest::Url::parse_with_params(&raw, &[("key", key)])
            .map(String::from)
            .map_err(|e| ProviderError::Network {
                provider: ProviderId::Gemini,
                message: format!("invalid endpoint {raw}: {e}"),
            })
    }

    /// Every message becomes one text part of a single content entry.
    fn to_api_body(request: &ChatRequest) -> serde_json::Value {
        let parts: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({ "text": m.content }))
            .collect();
        serde_json::json!({ "contents": [{ "parts": parts }] })
    }

    async fn complete(&self, request: ChatRequest) -> std::result::Result<String, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured {
            provider: ProviderId::Gemini,
        })?;
        let url = self.endpoint(key)?;

        debug!(provider = "gemini", model = %request.model, "Sending completion request");

        let reply = self
            .transport
            .send(
                ProviderId::Gemini,
                TransportRequest::post_json(url, Self::to_api_body(&request)),
            )
            .await?;
        let json = response::read_json(ProviderId::Gemini, &reply)?;
        Ok(response::text_at(
            &json,
            "/candidates/0/content/parts/0/text",
            &self.empty_answer,
        ))
    }
}

#[async_trait]
impl StageAdapter for GeminiAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn invoke(&self, input: &StageInput) -> std::result::Result<AdapterReply, ProviderError> {
        let request = prompts::pipeline_request(ProviderId::Gemini, &self.model, input);
        self.complete(request).await.map(AdapterReply::text)
    }

    async fn direct(&self, message: &str) -> std::result::Result<String, ProviderError> {
        let request = prompts::direct_request(ProviderId::Gemini, &self.model, message);
        self.complete(request).await
    }
}
