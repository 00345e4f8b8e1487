//! # MultiFlow Core
//!
//! Domain types, traits, and error definitions for the MultiFlow review
//! pipeline. This crate has **no transport or framework dependencies**: it
//! defines the model that the provider, pipeline, and gateway crates build on.
//!
//! The seams are traits: [`Transport`] for HTTP, [`StageAdapter`] per
//! provider, [`UpdateSink`] for progress, [`AvailabilitySource`] for keys.

pub mod availability;
pub mod context;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod stage;

// Re-export key types at crate root for ergonomics
pub use availability::{AvailabilitySnapshot, AvailabilitySource};
pub use context::{FinalSource, PipelineResult, RunContext};
pub use error::{Error, ProviderError, Result};
pub use event::{NoopSink, StageEvent, UpdateSink};
pub use message::{ChatRequest, Message, Role};
pub use provider::{
    AdapterReply, AdapterSet, Method, StageAdapter, StageInput, Transport, TransportRequest,
    TransportResponse,
};
pub use stage::{Capability, ProviderId, Stage, StageId, StageOutcome, STAGES};
