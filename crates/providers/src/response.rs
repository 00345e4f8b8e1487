//! Shared handling of provider HTTP replies: error envelopes, JSON bodies,
//! and text extraction.

use multiflow_core::error::ProviderError;
use multiflow_core::provider::TransportResponse;
use multiflow_core::ProviderId;
use serde_json::Value;
use tracing::warn;

/// Longest slice of a non-JSON error body kept as detail.
const RAW_DETAIL_CHARS: usize = 160;

/// Human-readable detail from an error body.
///
/// JSON bodies yield the first non-empty of `error.message`, `error.code`,
/// `error` (when it is a string) and `message`. Anything else yields the
/// first 160 characters of the raw body.
pub fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => {
            let candidates = [
                json.pointer("/error/message"),
                json.pointer("/error/code"),
                json.get("error"),
                json.get("message"),
            ];
            candidates
                .into_iter()
                .flatten()
                .filter_map(scalar_text)
                .find(|s| !s.is_empty())
                .unwrap_or_default()
        }
        Err(_) => trimmed.chars().take(RAW_DETAIL_CHARS).collect(),
    }
}

/// Strings and numbers as text; objects, arrays and nulls yield nothing.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Check the status and parse the body as JSON. An empty 2xx body counts as `{}`.
pub fn read_json(
    provider: ProviderId,
    response: &TransportResponse,
) -> std::result::Result<Value, ProviderError> {
    if !response.is_success() {
        let detail = error_detail(&response.body);
        warn!(provider = %provider, status = response.status, detail = %detail, "Provider returned an error status");
        return Err(ProviderError::Status {
            provider,
            status: response.status,
            detail,
        });
    }

    if response.body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        warn!(provider = %provider, error = %e, "Provider response is not JSON");
        ProviderError::Parse { provider }
    })
}

/// Trimmed text at `pointer`, or `empty` when missing or blank.
pub fn text_at(json: &Value, pointer: &str, empty: &str) -> String {
    non_blank(json.pointer(pointer).and_then(Value::as_str), empty)
}

/// Trimmed `text`, or `empty` when missing or blank.
pub fn non_blank(text: Option<&str>, empty: &str) -> String {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => empty.to_string(),
    }
}
