//! Stages, providers, and per-stage outcomes.
//!
//! The pipeline is a fixed sequence of stages. Each stage is bound at compile
//! time to one provider and one capability flag; nothing here is reordered at
//! runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one step in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageId {
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "reviewA")]
    ReviewA,
    #[serde(rename = "reviewB")]
    ReviewB,
    #[serde(rename = "reviewC")]
    ReviewC,
    #[serde(rename = "synthesis")]
    Synthesis,
    #[serde(rename = "final")]
    Final,
}

impl StageId {
    /// Execution order. `Final` is terminal and never invoked directly.
    pub const ORDER: [StageId; 6] = [
        StageId::Draft,
        StageId::ReviewA,
        StageId::ReviewB,
        StageId::ReviewC,
        StageId::Synthesis,
        StageId::Final,
    ];

    /// The five stages that each produce exactly one outcome per run.
    pub const EXECUTABLE: [StageId; 5] = [
        StageId::Draft,
        StageId::ReviewA,
        StageId::ReviewB,
        StageId::ReviewC,
        StageId::Synthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ReviewA => "reviewA",
            Self::ReviewB => "reviewB",
            Self::ReviewC => "reviewC",
            Self::Synthesis => "synthesis",
            Self::Final => "final",
        }
    }

    /// Position in [`StageId::ORDER`].
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final)
    }

    /// The provider that runs this stage. `Final` has no provider of its own.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::Draft => Some(ProviderId::Gemini),
            Self::ReviewA => Some(ProviderId::Claude),
            Self::ReviewB => Some(ProviderId::Grok),
            Self::ReviewC => Some(ProviderId::Perplexity),
            Self::Synthesis => Some(ProviderId::ChatGpt),
            Self::Final => None,
        }
    }

    /// Static stage descriptor.
    pub fn stage(&self) -> &'static Stage {
        &STAGES[self.ordinal()]
    }

    /// Stages strictly before this one.
    pub fn predecessors(&self) -> &'static [StageId] {
        &Self::ORDER[..self.ordinal()]
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider capability flag, one per configured provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    DraftProvider,
    ReviewAProvider,
    ReviewBProvider,
    ReviewCProvider,
    SynthesisProvider,
}

/// Static description of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub id: StageId,
    pub capability: Capability,
    pub ordinal: usize,
}

/// The stage table. `final` shares the synthesizer's capability.
pub static STAGES: [Stage; 6] = [
    Stage { id: StageId::Draft, capability: Capability::DraftProvider, ordinal: 0 },
    Stage { id: StageId::ReviewA, capability: Capability::ReviewAProvider, ordinal: 1 },
    Stage { id: StageId::ReviewB, capability: Capability::ReviewBProvider, ordinal: 2 },
    Stage { id: StageId::ReviewC, capability: Capability::ReviewCProvider, ordinal: 3 },
    Stage { id: StageId::Synthesis, capability: Capability::SynthesisProvider, ordinal: 4 },
    Stage { id: StageId::Final, capability: Capability::SynthesisProvider, ordinal: 5 },
];

/// The external LLM providers MultiFlow talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    Claude,
    Grok,
    Perplexity,
    #[serde(rename = "chatgpt")]
    ChatGpt,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Gemini,
        ProviderId::Claude,
        ProviderId::Grok,
        ProviderId::Perplexity,
        ProviderId::ChatGpt,
    ];

    /// Identifier used by the direct-query surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Grok => "grok",
            Self::Perplexity => "perplexity",
            Self::ChatGpt => "chatgpt",
        }
    }

    /// Name used in error messages (matches the vendor, not the model).
    pub fn vendor_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Claude => "Claude",
            Self::Grok => "xAI",
            Self::Perplexity => "Perplexity",
            Self::ChatGpt => "OpenAI",
        }
    }

    /// Human-readable model family name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Claude => "Claude",
            Self::Grok => "Grok",
            Self::Perplexity => "Perplexity",
            Self::ChatGpt => "ChatGPT",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::Gemini => Capability::DraftProvider,
            Self::Claude => Capability::ReviewAProvider,
            Self::Grok => Capability::ReviewBProvider,
            Self::Perplexity => Capability::ReviewCProvider,
            Self::ChatGpt => Capability::SynthesisProvider,
        }
    }

    /// The pipeline stage this provider runs.
    pub fn stage(&self) -> StageId {
        match self {
            Self::Gemini => StageId::Draft,
            Self::Claude => StageId::ReviewA,
            Self::Grok => StageId::ReviewB,
            Self::Perplexity => StageId::ReviewC,
            Self::ChatGpt => StageId::Synthesis,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| crate::error::Error::UnsupportedProvider(s.to_string()))
    }
}

/// The result of one stage in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The provider answered.
    Success(String),
    /// The provider is not configured; carries the skip placeholder.
    Skipped(String),
    /// The provider call failed; carries the formatted error message.
    Failed(String),
}

impl StageOutcome {
    /// The text downstream stages and the display see.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(t) | Self::Skipped(t) | Self::Failed(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Success(t) | Self::Skipped(t) | Self::Failed(t) => t,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
