//! Anthropic native Messages API adapter. Runs reviewer A.
//!
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Reply text is the concatenation of the `text` content blocks

use async_trait::async_trait;
use multiflow_core::error::ProviderError;
use multiflow_core::message::{ChatRequest, Message, Role};
use multiflow_core::provider::*;
use multiflow_core::ProviderId;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::prompts;
use crate::response;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Claude reviewer.
pub struct ClaudeAdapter {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    base_url: String,
    model: String,
    empty_answer: String,
}

impl ClaudeAdapter {
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: prompts::default_model(ProviderId::Claude).into(),
            empty_answer: "Empty answer".into(),
        }
    }

    /// Custom base URL (e.g., for testing or proxies).
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

    /// Extract system messages from the message list.
    /// Anthropic puts system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    fn to_api_body(request: &ChatRequest) -> Value {
        let (system, messages) = Self::extract_system(&request.messages);
        let api_messages: Vec<AnthropicMessage<'_>> = messages
            .iter()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": api_messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }
        body
    }

    /// Non-empty `text` blocks joined by newlines.
    fn response_text(json: &Value) -> Option<String> {
        let blocks = json.get("content")?.as_array()?;
        let text = blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Some(text)
    }

    async fn complete(&self, request: ChatRequest) -> std::result::Result<String, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured {
            provider: ProviderId::Claude,
        })?;
        let url = format!("{}/v1/messages", self.base_url);

        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let outbound = TransportRequest::post_json(url, Self::to_api_body(&request))
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let reply = self.transport.send(ProviderId::Claude, outbound).await?;
        let json = response::read_json(ProviderId::Claude, &reply)?;

        Ok(response::non_blank(
            Self::response_text(&json).as_deref(),
            &self.empty_answer,
        ))
    }
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[async_trait]
impl StageAdapter for ClaudeAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Claude
    }

    async fn invoke(&self, input: &StageInput) -> std::result::Result<AdapterReply, ProviderError> {
        let request = prompts::pipeline_request(ProviderId::Claude, &self.model, input);
        self.complete(request).await.map(AdapterReply::text)
    }

    async fn direct(&self, message: &str) -> std::result::Result<String, ProviderError> {
        let request = prompts::direct_request(ProviderId::Claude, &self.model, message);
        self.complete(request).await
    }
}
