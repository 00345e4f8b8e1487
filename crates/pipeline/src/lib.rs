//! Pipeline orchestration for MultiFlow.
//!
//! [`PipelineOrchestrator`] drives one question through the fixed stage
//! order; [`FallbackResolver`] supplies the final answer whenever the
//! synthesizer could not.

pub mod fallback;
pub mod orchestrator;

pub use fallback::{FALLBACK_PRIORITY, FallbackChoice, FallbackResolver};
pub use orchestrator::PipelineOrchestrator;
