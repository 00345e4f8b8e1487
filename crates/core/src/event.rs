//! Incremental stage updates published while a run is in progress.
//!
//! The orchestrator publishes one [`StageEvent`] per stage completion (plus
//! the `final` slot updates). Presentation layers subscribe by passing an
//! [`UpdateSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::stage::{StageId, StageOutcome};

/// One stage's outcome, as observed by a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub run_id: String,
    pub stage: StageId,
    pub outcome: StageOutcome,
    pub timestamp: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(run_id: impl Into<String>, stage: StageId, outcome: StageOutcome) -> Self {
        Self {
            run_id: run_id.into(),
            stage,
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// SSE event name.
    pub fn event_type(&self) -> &'static str {
        "stage"
    }
}

/// Receives stage updates. Publishing must not block the run.
pub trait UpdateSink: Send + Sync {
    fn publish(&self, event: &StageEvent);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl UpdateSink for NoopSink {
    fn publish(&self, _event: &StageEvent) {}
}

impl<F> UpdateSink for F
where
    F: Fn(&StageEvent) + Send + Sync,
{
    fn publish(&self, event: &StageEvent) {
        self(event)
    }
}

impl UpdateSink for mpsc::UnboundedSender<StageEvent> {
    fn publish(&self, event: &StageEvent) {
        // A dropped receiver just means nobody is watching anymore
        let _ = self.send(event.clone());
    }
}
