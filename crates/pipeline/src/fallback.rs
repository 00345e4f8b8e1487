//! Choosing a final answer when the synthesizer produced none.

use multiflow_config::Messages;
use multiflow_core::{AvailabilitySnapshot, FinalSource, RunContext, StageId};

/// Most- to least-reviewed.
pub const FALLBACK_PRIORITY: [StageId; 5] = [
    StageId::Synthesis,
    StageId::ReviewC,
    StageId::ReviewB,
    StageId::ReviewA,
    StageId::Draft,
];

/// The resolver's pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChoice {
    pub text: String,
    /// Stage the text came from; `None` when nothing qualified.
    pub stage: Option<StageId>,
}

impl FallbackChoice {
    pub fn source(&self) -> FinalSource {
        FinalSource::Fallback { stage: self.stage }
    }
}

/// Picks the best available stage output as the final answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResolver;

impl FallbackResolver {
    /// First stage in [`FALLBACK_PRIORITY`] that was available for this run and
    /// recorded non-blank text. The text is returned as recorded.
    pub fn resolve(
        context: &RunContext,
        availability: &AvailabilitySnapshot,
        messages: &Messages,
    ) -> FallbackChoice {
        FALLBACK_PRIORITY
            .iter()
            .filter(|&&stage| availability.is_available(stage))
            .find_map(|&stage| {
                let text = context.outcome(stage)?.text();
                (!text.trim().is_empty()).then(|| FallbackChoice {
                    text: text.to_string(),
                    stage: Some(stage),
                })
            })
            .unwrap_or_else(|| FallbackChoice {
                text: messages.no_final_answer.clone(),
                stage: None,
            })
    }
}
