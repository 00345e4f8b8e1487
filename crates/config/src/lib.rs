//! Configuration loading, validation, and management for MultiFlow.
//!
//! Loads configuration from `~/.multiflow/config.toml` (or the file named by
//! `MULTIFLOW_CONFIG`) with environment variable overrides for provider keys.
//! The loaded [`AppConfig`] is the credential/config collaborator the pipeline
//! consults for availability; it is passed around explicitly, never global.

use multiflow_core::availability::{AvailabilitySnapshot, AvailabilitySource};
use multiflow_core::stage::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.multiflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credentials, endpoints, and model overrides per provider
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Display strings used for placeholders and errors
    #[serde(default)]
    pub messages: Messages,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// One provider's settings.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (e.g., a proxy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// xAI team identifier, sent as `x-ai-team-id` (xAI only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("team_id", &redact(&self.team_id))
            .finish()
    }
}

impl ProviderConfig {
    /// The key, if present and not blank.
    pub fn api_key(&self) -> Option<&str> {
        non_blank(&self.api_key)
    }

    pub fn team_id(&self) -> Option<&str> {
        non_blank(&self.team_id)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Settings for the five providers, keyed by vendor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub claude: ProviderConfig,
    #[serde(default)]
    pub xai: ProviderConfig,
    #[serde(default)]
    pub perplexity: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::Gemini => &self.gemini,
            ProviderId::Claude => &self.claude,
            ProviderId::Grok => &self.xai,
            ProviderId::Perplexity => &self.perplexity,
            ProviderId::ChatGpt => &self.openai,
        }
    }

    pub fn get_mut(&mut self, provider: ProviderId) -> &mut ProviderConfig {
        match provider {
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::Claude => &mut self.claude,
            ProviderId::Grok => &mut self.xai,
            ProviderId::Perplexity => &mut self.perplexity,
            ProviderId::ChatGpt => &mut self.openai,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for provider calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Display strings for placeholders and error formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    /// Shown on a card before its stage completes
    #[serde(default = "default_waiting")]
    pub waiting: String,

    /// Recorded for a stage whose provider has no key
    #[serde(default = "default_skip")]
    pub skip: String,

    /// Shown in the final slot when the synthesizer is not configured
    #[serde(default = "default_final_missing")]
    pub final_missing: String,

    /// Fallback result when no stage produced usable text
    #[serde(default = "default_no_final_answer")]
    pub no_final_answer: String,

    /// Prefix for failed-stage messages
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,

    /// Returned when a provider answered with blank text
    #[serde(default = "default_empty_answer")]
    pub empty_answer: String,
}

fn default_waiting() -> String {
    "Waiting...".into()
}
fn default_skip() -> String {
    "API key not configured, model skipped.".into()
}
fn default_final_missing() -> String {
    "Final answer unavailable: the synthesis provider is not configured.".into()
}
fn default_no_final_answer() -> String {
    "No final answer available.".into()
}
fn default_error_prefix() -> String {
    "error".into()
}
fn default_empty_answer() -> String {
    "Empty answer".into()
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            waiting: default_waiting(),
            skip: default_skip(),
            final_missing: default_final_missing(),
            no_final_answer: default_no_final_answer(),
            error_prefix: default_error_prefix(),
            empty_answer: default_empty_answer(),
        }
    }
}

impl Messages {
    /// `"<prefix>: <error>"`, the text a failed stage shows.
    pub fn format_error(&self, error: &dyn Display) -> String {
        format!("{}: {error}", self.error_prefix)
    }

    /// A provider's own placeholder, used when its text was never recorded.
    pub fn placeholder(&self, provider: ProviderId) -> String {
        format!("[{} skipped]", provider.display_name())
    }
}

/// Key presence as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    pub gemini: bool,
    pub claude: bool,
    pub xai: bool,
    pub xai_team_id: bool,
    pub perplexity: bool,
    pub openai: bool,
}

/// Environment variables that carry provider keys.
pub const KEY_ENV_VARS: [(ProviderId, &str); 5] = [
    (ProviderId::Gemini, "GEMINI_API_KEY"),
    (ProviderId::Claude, "CLAUDE_API_KEY"),
    (ProviderId::Grok, "XAI_API_KEY"),
    (ProviderId::Perplexity, "PERPLEXITY_API_KEY"),
    (ProviderId::ChatGpt, "OPENAI_API_KEY"),
];

impl AppConfig {
    /// Load configuration from the default path, then apply environment
    /// overrides:
    /// - `GEMINI_API_KEY`, `CLAUDE_API_KEY`, `XAI_API_KEY`,
    ///   `PERPLEXITY_API_KEY`, `OPENAI_API_KEY`
    /// - `XAI_TEAM_ID`
    /// - `PORT` (gateway port)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment lookup. Non-empty env keys win over
    /// the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        for (provider, var) in KEY_ENV_VARS {
            if let Some(key) = present(var) {
                self.providers.get_mut(provider).api_key = Some(key);
            }
        }

        if let Some(team) = present("XAI_TEAM_ID") {
            self.providers.xai.team_id = Some(team);
        }

        if let Some(port) = present("PORT") {
            self.gateway.port = port
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("PORT is not a valid port: {port}")))?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".multiflow")
    }

    /// The config file in use: `MULTIFLOW_CONFIG` or `~/.multiflow/config.toml`.
    pub fn config_path() -> PathBuf {
        std::env::var("MULTIFLOW_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Which stages can run right now.
    pub fn availability(&self) -> AvailabilitySnapshot {
        AvailabilitySnapshot {
            draft_provider: self.providers.gemini.is_configured(),
            review_a_provider: self.providers.claude.is_configured(),
            review_b_provider: self.providers.xai.is_configured(),
            review_c_provider: self.providers.perplexity.is_configured(),
            synthesis_provider: self.providers.openai.is_configured(),
        }
    }

    pub fn key_status(&self) -> KeyStatus {
        KeyStatus {
            gemini: self.providers.gemini.is_configured(),
            claude: self.providers.claude.is_configured(),
            xai: self.providers.xai.is_configured(),
            xai_team_id: self.providers.xai.team_id().is_some(),
            perplexity: self.providers.perplexity.is_configured(),
            openai: self.providers.openai.is_configured(),
        }
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl AvailabilitySource for AppConfig {
    fn availability(&self) -> AvailabilitySnapshot {
        AppConfig::availability(self)
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.port, 8787);
        assert_eq!(config.http.timeout_secs, 120);
        assert!(config.validate().is_ok());
        assert_eq!(config.availability(), AvailabilitySnapshot::none());
    }

    #[test]
    fn config_roundtrip_toml() {
        let mut config = AppConfig::default();
        config.providers.claude.model = Some("claude-3-5-haiku-latest".into());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.providers.claude.model.as_deref(), Some("claude-3-5-haiku-latest"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 8787);
    }

    #[test]
    fn loads_provider_sections_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[providers.gemini]
api_key = "g-key"

[providers.xai]
api_key = "x-key"
team_id = "team-7"

[messages]
error_prefix = "Hata"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        let snap = config.availability();
        assert!(snap.draft_provider);
        assert!(snap.review_b_provider);
        assert!(!snap.synthesis_provider);
        assert_eq!(config.providers.xai.team_id(), Some("team-7"));
        assert_eq!(config.messages.error_prefix, "Hata");
        assert_eq!(config.messages.skip, default_skip());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "providers = 12").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_keys_override_file() {
        let mut config = AppConfig::default();
        config.providers.openai.api_key = Some("from-file".into());
        config
            .apply_env(env(&[
                ("OPENAI_API_KEY", "from-env"),
                ("CLAUDE_API_KEY", "  c-key  "),
                ("PERPLEXITY_API_KEY", "   "),
                ("XAI_TEAM_ID", "t1"),
                ("PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.providers.openai.api_key(), Some("from-env"));
        assert_eq!(config.providers.claude.api_key(), Some("c-key"));
        assert!(!config.providers.perplexity.is_configured());
        assert_eq!(config.providers.xai.team_id(), Some("t1"));
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn invalid_port_env_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_key_is_not_available() {
        let mut config = AppConfig::default();
        config.providers.gemini.api_key = Some("   ".into());
        assert!(!config.availability().draft_provider);
    }

    #[test]
    fn key_status_reports_team_id() {
        let mut config = AppConfig::default();
        config.providers.xai.team_id = Some("team".into());
        let status = config.key_status();
        assert!(status.xai_team_id);
        assert!(!status.xai);
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["xaiTeamId"], true);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.providers.claude.api_key = Some("sk-ant-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn messages_format_error_and_placeholder() {
        let messages = Messages::default();
        assert_eq!(messages.format_error(&"Gemini 401"), "error: Gemini 401");
        assert_eq!(messages.placeholder(ProviderId::Grok), "[Grok skipped]");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("8787"));
        assert!(toml_str.contains("error_prefix"));
    }
}
