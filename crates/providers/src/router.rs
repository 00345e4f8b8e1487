//! Direct query routing and adapter construction from configuration.

use multiflow_config::AppConfig;
use multiflow_core::error::{ProviderError, Result};
use multiflow_core::provider::{AdapterSet, Transport};
use multiflow_core::{AvailabilitySource, ProviderId};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::anthropic::ClaudeAdapter;
use crate::gemini::GeminiAdapter;
use crate::openai_compat::OpenAiCompatAdapter;
use crate::transport::HttpTransport;

/// Sends one ad hoc message to a single provider, outside the pipeline.
pub struct DirectQueryRouter {
    adapters: AdapterSet,
    availability: Arc<dyn AvailabilitySource>,
}

impl DirectQueryRouter {
    pub fn new(adapters: AdapterSet, availability: Arc<dyn AvailabilitySource>) -> Self {
        Self {
            adapters,
            availability,
        }
    }

    /// Route `message` to the provider named `provider_id`.
    pub async fn route(&self, provider_id: &str, message: &str) -> Result<String> {
        let provider: ProviderId = provider_id.parse()?;

        if !self.availability.availability().has(provider.capability()) {
            warn!(provider = %provider, "Direct query to an unconfigured provider");
            return Err(ProviderError::NotConfigured { provider }.into());
        }

        debug!(provider = %provider, "Routing direct query");
        let answer = self.adapters.get(provider).direct(message).await?;
        Ok(answer)
    }
}

/// Build the five adapters from configuration over a shared transport.
pub fn build_adapters(config: &AppConfig, transport: Arc<dyn Transport>) -> AdapterSet {
    let providers = &config.providers;
    let empty = config.messages.empty_answer.as_str();
    let key = |id: ProviderId| providers.get(id).api_key().map(str::to_string);
    let model = |id: ProviderId| {
        providers
            .get(id)
            .model
            .clone()
            .unwrap_or_else(|| crate::prompts::default_model(id).to_string())
    };

    let mut gemini = GeminiAdapter::new(transport.clone(), key(ProviderId::Gemini))
        .with_model(model(ProviderId::Gemini))
        .with_empty_answer(empty);
    if let Some(url) = &providers.gemini.api_url {
        gemini = gemini.with_base_url(url);
    }

    let mut claude = ClaudeAdapter::new(transport.clone(), key(ProviderId::Claude))
        .with_model(model(ProviderId::Claude))
        .with_empty_answer(empty);
    if let Some(url) = &providers.claude.api_url {
        claude = claude.with_base_url(url);
    }

    let compat = |id: ProviderId| {
        let mut adapter = OpenAiCompatAdapter::new(id, transport.clone(), key(id))
            .with_model(model(id))
            .with_empty_answer(empty);
        if let Some(url) = &providers.get(id).api_url {
            adapter = adapter.with_endpoint(url);
        }
        adapter
    };
    let grok = compat(ProviderId::Grok).with_team_id(providers.xai.team_id().map(str::to_string));

    AdapterSet::new(
        Arc::new(gemini),
        Arc::new(claude),
        Arc::new(grok),
        Arc::new(compat(ProviderId::Perplexity)),
        Arc::new(compat(ProviderId::ChatGpt)),
    )
}

/// Build adapters over an [`HttpTransport`] using the configured timeout.
pub fn build_from_config(config: &AppConfig) -> AdapterSet {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_secs(config.http.timeout_secs));
    build_adapters(config, transport)
}

/// Direct query router over configured adapters; availability is re-read from
/// `config` on every call.
pub fn direct_router(config: Arc<AppConfig>, adapters: AdapterSet) -> DirectQueryRouter {
    DirectQueryRouter::new(adapters, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use multiflow_core::AvailabilitySnapshot;
    use multiflow_core::error::Error;

    fn config_with(keys: &[(ProviderId, &str)]) -> AppConfig {
        let mut config = AppConfig::default();
        for (id, key) in keys {
            config.providers.get_mut(*id).api_key = Some(key.to_string());
        }
        config
    }

    fn completion(content: &str) -> String {
        serde_json::json!({"choices": [{"message": {"content": content}}]}).to_string()
    }

    #[tokio::test]
    async fn unknown_provider_is_unsupported() {
        let transport = ScriptedTransport::replying(200, "{}");
        let config = config_with(&[]);
        let router = DirectQueryRouter::new(
            build_adapters(&config, transport.clone()),
            Arc::new(AvailabilitySnapshot::all()),
        );
        let err = router.route("mistral", "hi").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(ref id) if id == "mistral"));
        assert_eq!(err.to_string(), "Unsupported model (mistral)");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_provider_is_not_called() {
        let transport = ScriptedTransport::replying(200, &completion("x"));
        let config = Arc::new(config_with(&[(ProviderId::ChatGpt, "sk")]));
        let router = direct_router(config.clone(), build_adapters(&config, transport.clone()));

        let err = router.route("grok", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "xAI key missing");
        assert_eq!(transport.calls(), 0);

        assert_eq!(router.route("chatgpt", "hi").await.unwrap(), "x");
        assert_eq!(transport.providers_called(), vec![ProviderId::ChatGpt]);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let transport = ScriptedTransport::replying(503, "upstream down");
        let config = Arc::new(config_with(&[(ProviderId::Perplexity, "p")]));
        let router = direct_router(config.clone(), build_adapters(&config, transport));
        let err = router.route("perplexity", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Perplexity 503 - upstream down");
    }

    #[tokio::test]
    async fn config_overrides_reach_adapters() {
        let transport = ScriptedTransport::replying(200, &completion("ok"));
        let mut config = config_with(&[(ProviderId::Grok, "xk")]);
        config.providers.xai.model = Some("grok-3".into());
        config.providers.xai.api_url = Some("http://proxy.local/v1/chat/completions".into());
        config.providers.xai.team_id = Some("team".into());
        let adapters = build_adapters(&config, transport.clone());

        adapters.get(ProviderId::Grok).direct("hi").await.unwrap();
        let sent = transport.last_request();
        assert_eq!(sent.endpoint, "http://proxy.local/v1/chat/completions");
        assert_eq!(sent.body["model"], "grok-3");
        assert_eq!(sent.header_value("x-ai-team-id"), Some("team"));
    }

    #[tokio::test]
    async fn configured_empty_answer_is_used() {
        let transport = ScriptedTransport::replying(200, r#"{"choices":[]}"#);
        let mut config = config_with(&[(ProviderId::Perplexity, "p")]);
        config.messages.empty_answer = "Nothing came back".into();
        let adapters = build_adapters(&config, transport);
        assert_eq!(
            adapters.get(ProviderId::Perplexity).direct("hi").await.unwrap(),
            "Nothing came back"
        );
    }

    #[test]
    fn build_from_default_config() {
        let adapters = build_from_config(&AppConfig::default());
        for id in ProviderId::ALL {
            assert_eq!(adapters.get(id).provider(), id);
        }
    }
}
