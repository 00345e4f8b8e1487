//! Provider availability, captured once at the start of a run.

use serde::{Deserialize, Serialize};

use crate::stage::{Capability, StageId};

/// Which providers have credentials, frozen for the duration of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySnapshot {
    #[serde(default)]
    pub draft_provider: bool,
    #[serde(default)]
    pub review_a_provider: bool,
    #[serde(default)]
    pub review_b_provider: bool,
    #[serde(default)]
    pub review_c_provider: bool,
    #[serde(default)]
    pub synthesis_provider: bool,
}

impl AvailabilitySnapshot {
    /// Every provider configured.
    pub fn all() -> Self {
        Self {
            draft_provider: true,
            review_a_provider: true,
            review_b_provider: true,
            review_c_provider: true,
            synthesis_provider: true,
        }
    }

    /// No provider configured.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from a 5-bit mask, bit 0 = draft ... bit 4 = synthesis.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            draft_provider: bits & 0b00001 != 0,
            review_a_provider: bits & 0b00010 != 0,
            review_b_provider: bits & 0b00100 != 0,
            review_c_provider: bits & 0b01000 != 0,
            synthesis_provider: bits & 0b10000 != 0,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::DraftProvider => self.draft_provider,
            Capability::ReviewAProvider => self.review_a_provider,
            Capability::ReviewBProvider => self.review_b_provider,
            Capability::ReviewCProvider => self.review_c_provider,
            Capability::SynthesisProvider => self.synthesis_provider,
        }
    }

    /// Number of configured providers.
    pub fn count(&self) -> usize {
        [
            self.draft_provider,
            self.review_a_provider,
            self.review_b_provider,
            self.review_c_provider,
            self.synthesis_provider,
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }

    /// Whether `stage` can run under this snapshot.
    pub fn is_available(&self, stage: StageId) -> bool {
        self.has(stage.stage().capability)
    }

    /// Builder-style toggle, handy in tests.
    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        match capability {
            Capability::DraftProvider => self.draft_provider = value,
            Capability::ReviewAProvider => self.review_a_provider = value,
            Capability::ReviewBProvider => self.review_b_provider = value,
            Capability::ReviewCProvider => self.review_c_provider = value,
            Capability::SynthesisProvider => self.synthesis_provider = value,
        }
        self
    }
}

/// Anything that can report which providers are configured right now.
///
/// Callers snapshot this once per run and pass the snapshot to the
/// orchestrator; later changes do not affect a run already in progress.
pub trait AvailabilitySource: Send + Sync {
    fn availability(&self) -> AvailabilitySnapshot;
}

impl AvailabilitySource for AvailabilitySnapshot {
    fn availability(&self) -> AvailabilitySnapshot {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_map_to_stages() {
        let snap = AvailabilitySnapshot::from_bits(0b10011);
        assert!(snap.is_available(StageId::Draft));
        assert!(snap.is_available(StageId::ReviewA));
        assert!(!snap.is_available(StageId::ReviewB));
        assert!(!snap.is_available(StageId::ReviewC));
        assert!(snap.is_available(StageId::Synthesis));
        assert!(snap.is_available(StageId::Final));
    }

    #[test]
    fn all_and_none() {
        assert_eq!(AvailabilitySnapshot::from_bits(0b11111), AvailabilitySnapshot::all());
        assert_eq!(AvailabilitySnapshot::from_bits(0), AvailabilitySnapshot::none());
        assert_eq!(AvailabilitySnapshot::all().count(), 5);
        assert_eq!(AvailabilitySnapshot::from_bits(0b10011).count(), 3);
    }

    #[test]
    fn with_toggles_single_flag() {
        let snap = AvailabilitySnapshot::all().with(Capability::ReviewBProvider, false);
        assert!(!snap.review_b_provider);
        assert!(snap.review_c_provider);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(AvailabilitySnapshot::all()).unwrap();
        assert_eq!(json["draftProvider"], true);
        assert_eq!(json["synthesisProvider"], true);
    }
}
