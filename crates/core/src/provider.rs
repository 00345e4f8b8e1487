//! Provider-facing traits: the transport boundary and the stage adapter.
//!
//! A [`Transport`] moves one JSON request to an endpoint and hands back the
//! raw status and body. A [`StageAdapter`] knows one provider's request and
//! response shapes and uses a transport to talk to it.
//!
//! Implementations: `HttpTransport` plus the five provider adapters in
//! `multiflow-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ProviderError;
use crate::stage::{ProviderId, StageId};

/// HTTP method for a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// One outbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportRequest {
    pub endpoint: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl TransportRequest {
    /// A JSON POST with a `Content-Type` header already set.
    pub fn post_json(endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The raw reply of a transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to provider endpoints.
///
/// Only failures to obtain a response at all are errors here; HTTP error
/// statuses come back as an ordinary [`TransportResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        provider: ProviderId,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, ProviderError>;
}

/// What a stage adapter is given: the question plus every earlier stage's
/// resolved text, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInput {
    pub question: String,
    pub prior: Vec<(StageId, String)>,
}

impl StageInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            prior: Vec::new(),
        }
    }

    pub fn with_prior(mut self, stage: StageId, text: impl Into<String>) -> Self {
        self.prior.push((stage, text.into()));
        self
    }

    /// Resolved text of an earlier stage.
    pub fn get(&self, stage: StageId) -> Option<&str> {
        self.prior
            .iter()
            .find(|(id, _)| *id == stage)
            .map(|(_, text)| text.as_str())
    }
}

/// A successful adapter reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReply {
    /// The text recorded for the stage itself.
    pub text: String,
    /// Set only by the synthesizer: the text for the `final` slot.
    pub final_answer: Option<String>,
}

impl AdapterReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            final_answer: None,
        }
    }

    pub fn synthesis(analysis: impl Into<String>, final_answer: impl Into<String>) -> Self {
        Self {
            text: analysis.into(),
            final_answer: Some(final_answer.into()),
        }
    }
}

/// One provider's request builder and response parser.
#[async_trait]
pub trait StageAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn provider(&self) -> ProviderId;

    /// Pipeline call: review (or draft, or synthesize) using prior stage text.
    async fn invoke(&self, input: &StageInput) -> std::result::Result<AdapterReply, ProviderError>;

    /// Single-turn call outside the pipeline.
    async fn direct(&self, message: &str) -> std::result::Result<String, ProviderError>;
}

/// The five adapters of a pipeline, one per provider.
#[derive(Clone)]
pub struct AdapterSet {
    adapters: [Arc<dyn StageAdapter>; 5],
}

impl AdapterSet {
    pub fn new(
        gemini: Arc<dyn StageAdapter>,
        claude: Arc<dyn StageAdapter>,
        grok: Arc<dyn StageAdapter>,
        perplexity: Arc<dyn StageAdapter>,
        chatgpt: Arc<dyn StageAdapter>,
    ) -> Self {
        Self {
            adapters: [gemini, claude, grok, perplexity, chatgpt],
        }
    }

    pub fn get(&self, provider: ProviderId) -> &Arc<dyn StageAdapter> {
        &self.adapters[provider as usize]
    }

    /// The adapter that runs `stage`; `None` for the terminal stage.
    pub fn for_stage(&self, stage: StageId) -> Option<&Arc<dyn StageAdapter>> {
        stage.provider().map(|p| self.get(p))
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.provider()))
            .finish()
    }
}
