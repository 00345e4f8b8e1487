//! Error types for the MultiFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Provider failures are caught at the stage boundary by the orchestrator;
//! only the direct-query path hands them back to callers.

use thiserror::Error;

use crate::stage::ProviderId;

/// The top-level error type for all MultiFlow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error(transparent)]
    Provider(#[from] ProviderError),

    // --- Direct query ---
    #[error("Unsupported model ({0})")]
    UnsupportedProvider(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A failed call to one provider.
///
/// The `Display` output is what ends up on a failed stage's card, after the
/// configured error prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Non-2xx HTTP status.
    #[error("{} {status}{}", .provider.vendor_name(), detail_suffix(.detail))]
    Status {
        provider: ProviderId,
        status: u16,
        detail: String,
    },

    /// 2xx response whose body is not valid JSON.
    #[error("{} response could not be parsed as JSON", .provider.vendor_name())]
    Parse { provider: ProviderId },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("{} request failed: {message}", .provider.vendor_name())]
    Network { provider: ProviderId, message: String },

    /// No credentials for this provider.
    #[error("{} key missing", .provider.vendor_name())]
    NotConfigured { provider: ProviderId },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Status { provider, .. }
            | Self::Parse { provider }
            | Self::Network { provider, .. }
            | Self::NotConfigured { provider } => *provider,
        }
    }

    /// HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" - {detail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_with_detail() {
        let err = ProviderError::Status {
            provider: ProviderId::Gemini,
            status: 401,
            detail: "API key not valid".into(),
        };
        assert_eq!(err.to_string(), "Gemini 401 - API key not valid");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn status_error_without_detail_has_no_suffix() {
        let err = ProviderError::Status {
            provider: ProviderId::ChatGpt,
            status: 500,
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "OpenAI 500");
    }

    #[test]
    fn parse_error_names_vendor() {
        let err = ProviderError::Parse {
            provider: ProviderId::Grok,
        };
        assert_eq!(err.to_string(), "xAI response could not be parsed as JSON");
        assert_eq!(err.provider(), ProviderId::Grok);
    }

    #[test]
    fn top_level_wraps_provider_transparently() {
        let err: Error = ProviderError::NotConfigured {
            provider: ProviderId::Claude,
        }
        .into();
        assert_eq!(err.to_string(), "Claude key missing");
    }

    #[test]
    fn missing_key_names_the_vendor() {
        let grok = ProviderError::NotConfigured { provider: ProviderId::Grok };
        let chatgpt = ProviderError::NotConfigured { provider: ProviderId::ChatGpt };
        assert_eq!(grok.to_string(), "xAI key missing");
        assert_eq!(chatgpt.to_string(), "OpenAI key missing");
    }

    #[test]
    fn unsupported_provider_displays_id() {
        let err = Error::UnsupportedProvider("mistral".into());
        assert!(err.to_string().contains("mistral"));
    }
}
