//! Per-run context and the final result projection.
//!
//! A [`RunContext`] is created for one run, grows as stages finish, and is
//! consumed into a [`PipelineResult`] when the run completes. It is never
//! shared between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{Error, Result};
use crate::provider::StageInput;
use crate::stage::{StageId, StageOutcome};

/// Where the `final` text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinalSource {
    /// The synthesizer's own `final` field.
    Synthesis,
    /// Chosen by the fallback resolver; `stage` is `None` when nothing qualified.
    Fallback { stage: Option<StageId> },
}

/// Accumulated stage outputs of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    question: String,
    outcomes: BTreeMap<StageId, StageOutcome>,
    final_answer: Option<(String, FinalSource)>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            question: question.into(),
            outcomes: BTreeMap::new(),
            final_answer: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Record the single outcome of a non-terminal stage.
    pub fn record(&mut self, stage: StageId, outcome: StageOutcome) -> Result<()> {
        if stage.is_terminal() {
            return Err(Error::Internal(
                "the final slot is committed, not recorded".into(),
            ));
        }
        if self.outcomes.contains_key(&stage) {
            warn!(run_id = %self.run_id, stage = %stage, "Stage recorded twice");
            return Err(Error::Internal(format!("stage {stage} already recorded")));
        }
        self.outcomes.insert(stage, outcome);
        Ok(())
    }

    /// Commit the `final` slot. Allowed once per run.
    pub fn commit_final(&mut self, text: impl Into<String>, source: FinalSource) -> Result<()> {
        if self.final_answer.is_some() {
            warn!(run_id = %self.run_id, "Final slot committed twice");
            return Err(Error::Internal("final slot already committed".into()));
        }
        self.final_answer = Some((text.into(), source));
        Ok(())
    }

    pub fn outcome(&self, stage: StageId) -> Option<&StageOutcome> {
        self.outcomes.get(&stage)
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_ref().map(|(text, _)| text.as_str())
    }

    /// Text of `stage` as downstream stages see it. Falls back to that
    /// stage's own placeholder when nothing has been recorded.
    pub fn resolved<'a>(&'a self, stage: StageId, placeholder: &'a str) -> &'a str {
        self.outcomes
            .get(&stage)
            .map(StageOutcome::text)
            .unwrap_or(placeholder)
    }

    /// Adapter input for `stage`: the question plus every predecessor's text.
    pub fn input_for<F>(&self, stage: StageId, placeholder: F) -> StageInput
    where
        F: Fn(StageId) -> String,
    {
        let prior = stage
            .predecessors()
            .iter()
            .map(|&id| {
                let fallback = placeholder(id);
                (id, self.resolved(id, &fallback).to_string())
            })
            .collect();
        StageInput {
            question: self.question.clone(),
            prior,
        }
    }

    /// Whether every non-terminal stage has an outcome and `final` is set.
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == StageId::EXECUTABLE.len() && self.final_answer.is_some()
    }

    /// Close the run.
    pub fn finish(self) -> Result<PipelineResult> {
        if !self.is_complete() {
            return Err(Error::Internal(format!(
                "run finished with {} of {} stages recorded, final {}",
                self.outcomes.len(),
                StageId::EXECUTABLE.len(),
                if self.final_answer.is_some() { "set" } else { "missing" }
            )));
        }
        let Some((final_answer, final_source)) = self.final_answer else {
            return Err(Error::Internal("run finished without a final answer".into()));
        };
        Ok(PipelineResult {
            run_id: self.run_id,
            question: self.question,
            stages: self.outcomes,
            final_answer,
            final_source,
        })
    }
}

/// The completed run as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub question: String,
    pub stages: BTreeMap<StageId, StageOutcome>,
    #[serde(rename = "final")]
    pub final_answer: String,
    pub final_source: FinalSource,
}

impl PipelineResult {
    pub fn outcome(&self, stage: StageId) -> Option<&StageOutcome> {
        self.stages.get(&stage)
    }

    /// Stage id → display text, for all six slots in pipeline order.
    pub fn display(&self) -> Vec<(StageId, &str)> {
        StageId::ORDER
            .iter()
            .map(|&id| {
                let text = if id.is_terminal() {
                    self.final_answer.as_str()
                } else {
                    self.stages.get(&id).map(StageOutcome::text).unwrap_or_default()
                };
                (id, text)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(id: StageId) -> String {
        format!("[{id} skipped]")
    }

    #[test]
    fn record_once_per_stage() {
        let mut ctx = RunContext::new("r", "q");
        ctx.record(StageId::Draft, StageOutcome::Success("d".into())).unwrap();
        assert!(ctx.record(StageId::Draft, StageOutcome::Success("again".into())).is_err());
        assert_eq!(ctx.outcome(StageId::Draft).unwrap().text(), "d");
    }

    #[test]
    fn final_cannot_be_recorded_as_stage() {
        let mut ctx = RunContext::new("r", "q");
        assert!(ctx.record(StageId::Final, StageOutcome::Success("f".into())).is_err());
    }

    #[test]
    fn final_committed_once() {
        let mut ctx = RunContext::new("r", "q");
        ctx.commit_final("a", FinalSource::Synthesis).unwrap();
        assert!(ctx.commit_final("b", FinalSource::Synthesis).is_err());
        assert_eq!(ctx.final_answer(), Some("a"));
    }

    #[test]
    fn resolved_uses_placeholder_only_when_absent() {
        let mut ctx = RunContext::new("r", "q");
        ctx.record(StageId::Draft, StageOutcome::Failed("Error: x".into())).unwrap();
        assert_eq!(ctx.resolved(StageId::Draft, "[ph]"), "Error: x");
        assert_eq!(ctx.resolved(StageId::ReviewA, "[ph]"), "[ph]");
    }

    #[test]
    fn input_contains_every_predecessor() {
        let mut ctx = RunContext::new("r", "What?");
        ctx.record(StageId::Draft, StageOutcome::Success("d".into())).unwrap();
        ctx.record(StageId::ReviewA, StageOutcome::Skipped("skip".into())).unwrap();
        let input = ctx.input_for(StageId::ReviewC, placeholder);
        assert_eq!(input.question, "What?");
        assert_eq!(
            input.prior,
            vec![
                (StageId::Draft, "d".to_string()),
                (StageId::ReviewA, "skip".to_string()),
                (StageId::ReviewB, "[reviewB skipped]".to_string()),
            ]
        );
    }

    #[test]
    fn finish_requires_all_stages_and_final() {
        let mut ctx = RunContext::new("r", "q");
        for id in StageId::EXECUTABLE {
            ctx.record(id, StageOutcome::Success(id.to_string())).unwrap();
        }
        assert!(!ctx.is_complete());
        assert!(ctx.clone().finish().is_err());

        ctx.commit_final("answer", FinalSource::Fallback { stage: Some(StageId::ReviewC) })
            .unwrap();
        assert!(ctx.is_complete());
        let result = ctx.finish().unwrap();
        let display = result.display();
        assert_eq!(display.len(), 6);
        assert_eq!(display[5], (StageId::Final, "answer"));
        assert_eq!(display[0], (StageId::Draft, "draft"));
    }

    #[test]
    fn result_serializes_final_field() {
        let mut ctx = RunContext::new("r", "q");
        for id in StageId::EXECUTABLE {
            ctx.record(id, StageOutcome::Skipped("s".into())).unwrap();
        }
        ctx.commit_final("none", FinalSource::Fallback { stage: None }).unwrap();
        let json = serde_json::to_value(ctx.finish().unwrap()).unwrap();
        assert_eq!(json["final"], "none");
        assert_eq!(json["final_source"]["kind"], "fallback");
        assert_eq!(json["stages"]["reviewB"]["status"], "skipped");
    }
}
