//! OpenAI-compatible chat completions adapter.
//!
//! Serves three stages: Grok (xAI, reviewer B), Perplexity (reviewer C) and
//! ChatGPT (OpenAI, synthesizer). All three take `Authorization: Bearer` and
//! answer in `choices[0].message.content`.

use async_trait::async_trait;
use multiflow_core::error::ProviderError;
use multiflow_core::message::ChatRequest;
use multiflow_core::provider::*;
use multiflow_core::ProviderId;
use std::sync::Arc;
use tracing::debug;

use crate::prompts;
use crate::response;
use crate::synthesis::parse_synthesis_output;

/// Title xAI shows for requests from this application.
const XAI_TITLE: &str = "MultiFlow";

/// An OpenAI-compatible provider bound to one pipeline stage.
pub struct OpenAiCompatAdapter {
    provider: ProviderId,
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    team_id: Option<String>,
    empty_answer: String,
}

impl OpenAiCompatAdapter {
    /// Create an adapter for `provider` with its default endpoint and model.
    ///
    /// Only Grok, Perplexity and ChatGPT speak this protocol.
    pub fn new(
        provider: ProviderId,
        transport: Arc<dyn Transport>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            provider,
            transport,
            api_key,
            endpoint: default_endpoint(provider).into(),
            model: prompts::default_model(provider).into(),
            team_id: None,
            empty_answer: "Empty answer".into(),
        }
    }

    /// xAI reviewer (convenience constructor).
    pub fn grok(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self::new(ProviderId::Grok, transport, api_key)
    }

    /// Perplexity reviewer (convenience constructor).
    pub fn perplexity(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self::new(ProviderId::Perplexity, transport, api_key)
    }

    /// OpenAI synthesizer (convenience constructor).
    pub fn chatgpt(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self::new(ProviderId::ChatGpt, transport, api_key)
    }

    /// Full chat completions URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// xAI team identifier, sent as `x-ai-team-id`. Ignored by other providers.
    pub fn with_team_id(mut self, team_id: Option<String>) -> Self {
        self.team_id = team_id;
        self
    }

    pub fn with_empty_answer(mut self, empty_answer: impl Into<String>) -> Self {
        self.empty_answer = empty_answer.into();
        self
    }

    fn to_api_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    /// Raw trimmed `choices[0].message.content`; blank when absent.
    async fn complete_raw(&self, request: ChatRequest) -> std::result::Result<String, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured {
            provider: self.provider,
        })?;

        let mut outbound = TransportRequest::post_json(&self.endpoint, Self::to_api_body(&request))
            .header("Authorization", format!("Bearer {key}"));
        if self.provider == ProviderId::Grok {
            outbound = outbound.header("X-Title", XAI_TITLE);
            if let Some(team) = self.team_id.as_deref().filter(|t| !t.trim().is_empty()) {
                outbound = outbound.header("x-ai-team-id", team.trim());
            }
        }

        debug!(provider = %self.provider, model = %request.model, "Sending completion request");

        let reply = self.transport.send(self.provider, outbound).await?;
        let json = response::read_json(self.provider, &reply)?;
        Ok(response::text_at(&json, "/choices/0/message/content", ""))
    }
}

/// Chat completions URL for the providers this adapter serves.
fn default_endpoint(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Grok => "https://api.x.ai/v1/chat/completions",
        ProviderId::Perplexity => "https://api.perplexity.ai/chat/completions",
        _ => "https://api.openai.com/v1/chat/completions",
    }
}

#[async_trait]
impl StageAdapter for OpenAiCompatAdapter {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    async fn invoke(&self, input: &StageInput) -> std::result::Result<AdapterReply, ProviderError> {
        let request = prompts::pipeline_request(self.provider, &self.model, input);
        let raw = self.complete_raw(request).await?;

        if self.provider == ProviderId::ChatGpt {
            let parsed = parse_synthesis_output(&raw, &self.empty_answer);
            return Ok(AdapterReply::synthesis(parsed.analysis, parsed.final_answer));
        }
        Ok(AdapterReply::text(response::non_blank(Some(&raw), &self.empty_answer)))
    }

    async fn direct(&self, message: &str) -> std::result::Result<String, ProviderError> {
        let request = prompts::direct_request(self.provider, &self.model, message);
        let raw = self.complete_raw(request).await?;
        Ok(response::non_blank(Some(&raw), &self.empty_answer))
    }
}
