//! A scripted [`Transport`] for tests: canned replies per provider and a log
//! of every request sent.

use async_trait::async_trait;
use multiflow_core::error::ProviderError;
use multiflow_core::provider::{Transport, TransportRequest, TransportResponse};
use multiflow_core::ProviderId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

type Reply = std::result::Result<TransportResponse, ProviderError>;

/// Replies from per-provider queues, then from the shared default reply.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queues: Mutex<HashMap<ProviderId, VecDeque<Reply>>>,
    default_reply: Option<TransportResponse>,
    requests: Mutex<Vec<(ProviderId, TransportRequest)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request gets the same reply.
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            default_reply: Some(TransportResponse::new(status, body)),
            ..Self::default()
        })
    }

    /// Queue a reply for one provider.
    pub fn reply(self, provider: ProviderId, status: u16, body: &str) -> Self {
        self.push(provider, Ok(TransportResponse::new(status, body)))
    }

    /// Queue a transport-level failure for one provider.
    pub fn fail(self, provider: ProviderId, message: &str) -> Self {
        self.push(
            provider,
            Err(ProviderError::Network {
                provider,
                message: message.into(),
            }),
        )
    }

    fn push(self, provider: ProviderId, reply: Reply) -> Self {
        self.queues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(provider)
            .or_default()
            .push_back(reply);
        self
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.log().len()
    }

    /// Providers contacted, in order.
    pub fn providers_called(&self) -> Vec<ProviderId> {
        self.log().iter().map(|(p, _)| *p).collect()
    }

    /// Requests sent to one provider.
    pub fn requests_for(&self, provider: ProviderId) -> Vec<TransportRequest> {
        self.log()
            .iter()
            .filter(|(p, _)| *p == provider)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// The most recent request. Panics if nothing was sent.
    pub fn last_request(&self) -> TransportRequest {
        match self.log().last() {
            Some((_, request)) => request.clone(),
            None => panic!("no request was sent"),
        }
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<(ProviderId, TransportRequest)>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        provider: ProviderId,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, ProviderError> {
        self.log().push((provider, request));

        let queued = self
            .queues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&provider)
            .and_then(VecDeque::pop_front);

        match (queued, &self.default_reply) {
            (Some(reply), _) => reply,
            (None, Some(reply)) => Ok(reply.clone()),
            (None, None) => Err(ProviderError::Network {
                provider,
                message: "no scripted reply".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queues_before_default() {
        let transport = ScriptedTransport {
            default_reply: Some(TransportResponse::new(200, "default")),
            ..ScriptedTransport::new()
        }
        .reply(ProviderId::Claude, 500, "first");

        let req = || TransportRequest::post_json("http://x", serde_json::json!({}));
        let first = transport.send(ProviderId::Claude, req()).await.unwrap();
        let second = transport.send(ProviderId::Claude, req()).await.unwrap();
        assert_eq!(first.status, 500);
        assert_eq!(second.body, "default");
        assert_eq!(transport.providers_called(), vec![ProviderId::Claude; 2]);
    }

    #[tokio::test]
    async fn unscripted_provider_fails() {
        let transport = ScriptedTransport::new().fail(ProviderId::Grok, "timed out");
        let req = TransportRequest::post_json("http://x", serde_json::json!({}));
        let err = transport.send(ProviderId::Grok, req.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "xAI request failed: timed out");
        assert!(transport.send(ProviderId::Gemini, req).await.is_err());
        assert_eq!(transport.calls(), 2);
    }
}
