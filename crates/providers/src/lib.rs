//! Provider adapters for MultiFlow.
//!
//! Every adapter implements `multiflow_core::StageAdapter` on top of a
//! `multiflow_core::Transport`. [`build_from_config`] wires all five from
//! configuration; [`DirectQueryRouter`] serves single-provider questions.

pub mod anthropic;
pub mod gemini;
pub mod openai_compat;
pub mod prompts;
pub mod response;
pub mod router;
pub mod synthesis;
pub mod testing;
pub mod transport;

pub use anthropic::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai_compat::OpenAiCompatAdapter;
pub use router::{build_adapters, build_from_config, direct_router, DirectQueryRouter};
pub use synthesis::{parse_synthesis_output, SynthesisOutput};
pub use transport::HttpTransport;
