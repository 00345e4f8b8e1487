//! The review pipeline: one question through draft, three reviews and a
//! synthesis, strictly in order.

use multiflow_config::Messages;
use multiflow_core::error::{Error, Result};
use multiflow_core::provider::{AdapterReply, AdapterSet};
use multiflow_core::{
    AvailabilitySnapshot, FinalSource, PipelineResult, RunContext, StageEvent, StageId,
    StageOutcome, UpdateSink,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::fallback::FallbackResolver;

/// Runs questions through the fixed stage sequence.
///
/// Holds only shared, immutable state; every run gets its own [`RunContext`],
/// so one orchestrator can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    adapters: AdapterSet,
    messages: Messages,
}

impl PipelineOrchestrator {
    pub fn new(adapters: AdapterSet, messages: Messages) -> Self {
        Self { adapters, messages }
    }

    /// Run `question` through every stage.
    ///
    /// `availability` is the snapshot taken by the caller at run start; it is
    /// not re-read mid-run. Provider failures never abort the run: they are
    /// recorded on their stage and the next stage proceeds. One update is
    /// published per stage, plus the `final` slot updates.
    pub async fn run(
        &self,
        question: &str,
        availability: AvailabilitySnapshot,
        sink: &dyn UpdateSink,
    ) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, ?availability, "Pipeline run started");

        let mut ctx = RunContext::new(&run_id, question);

        for stage in StageId::EXECUTABLE {
            if !availability.is_available(stage) {
                warn!(run_id = %run_id, stage = %stage, "Provider not configured, stage skipped");
                self.record(&mut ctx, stage, StageOutcome::Skipped(self.messages.skip.clone()), sink)?;

                if stage == StageId::Synthesis {
                    sink.publish(&StageEvent::new(
                        &run_id,
                        StageId::Final,
                        StageOutcome::Skipped(self.messages.final_missing.clone()),
                    ));
                    self.commit_fallback(&mut ctx, &availability, sink)?;
                }
                continue;
            }

            let adapter = self
                .adapters
                .for_stage(stage)
                .ok_or_else(|| Error::Internal(format!("no adapter bound to stage {stage}")))?;
            let input = ctx.input_for(stage, |id| self.placeholder(id));

            debug!(run_id = %run_id, stage = %stage, provider = %adapter.provider(), "Invoking stage");

            match adapter.invoke(&input).await {
                Ok(reply) => {
                    if stage == StageId::Synthesis {
                        self.commit_synthesis(&mut ctx, reply, sink)?;
                    } else {
                        self.record(&mut ctx, stage, StageOutcome::Success(reply.text), sink)?;
                    }
                }
                Err(e) => {
                    warn!(
                        run_id = %run_id,
                        stage = %stage,
                        provider = %e.provider(),
                        status = ?e.status(),
                        error = %e,
                        "Stage failed"
                    );
                    let message = self.messages.format_error(&e);
                    self.record(&mut ctx, stage, StageOutcome::Failed(message), sink)?;

                    if stage == StageId::Synthesis {
                        self.commit_fallback(&mut ctx, &availability, sink)?;
                    }
                }
            }
        }

        let result = ctx.finish()?;
        info!(run_id = %run_id, final_source = ?result.final_source, "Pipeline run finished");
        Ok(result)
    }

    /// Text a stage's successors see when that stage recorded nothing.
    fn placeholder(&self, stage: StageId) -> String {
        stage
            .provider()
            .map(|p| self.messages.placeholder(p))
            .unwrap_or_default()
    }

    fn record(
        &self,
        ctx: &mut RunContext,
        stage: StageId,
        outcome: StageOutcome,
        sink: &dyn UpdateSink,
    ) -> Result<()> {
        let event = StageEvent::new(ctx.run_id(), stage, outcome.clone());
        ctx.record(stage, outcome)?;
        sink.publish(&event);
        Ok(())
    }

    /// Analysis into the synthesis slot, final text into `final`. A blank
    /// synthesis is kept as is; it does not trigger the fallback.
    fn commit_synthesis(
        &self,
        ctx: &mut RunContext,
        reply: AdapterReply,
        sink: &dyn UpdateSink,
    ) -> Result<()> {
        let final_answer = reply.final_answer.unwrap_or_else(|| reply.text.clone());
        self.record(ctx, StageId::Synthesis, StageOutcome::Success(reply.text), sink)?;

        ctx.commit_final(final_answer.clone(), FinalSource::Synthesis)?;
        sink.publish(&StageEvent::new(
            ctx.run_id(),
            StageId::Final,
            StageOutcome::Success(final_answer),
        ));
        Ok(())
    }

    fn commit_fallback(
        &self,
        ctx: &mut RunContext,
        availability: &AvailabilitySnapshot,
        sink: &dyn UpdateSink,
    ) -> Result<()> {
        let choice = FallbackResolver::resolve(ctx, availability, &self.messages);
        debug!(run_id = %ctx.run_id(), from = ?choice.stage, "Final answer from fallback");

        // The published outcome mirrors the kind of the stage the text came from
        let outcome = match choice.stage.and_then(|s| ctx.outcome(s)) {
            Some(StageOutcome::Failed(_)) => StageOutcome::Failed(choice.text.clone()),
            Some(_) => StageOutcome::Success(choice.text.clone()),
            None => StageOutcome::Skipped(choice.text.clone()),
        };

        ctx.commit_final(choice.text.clone(), choice.source())?;
        sink.publish(&StageEvent::new(ctx.run_id(), StageId::Final, outcome));
        Ok(())
    }
}
