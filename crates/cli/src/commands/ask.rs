//! `multiflow ask`: Run the full review pipeline on one question.

use multiflow_core::{FinalSource, StageEvent, StageId, StageOutcome};
use multiflow_pipeline::PipelineOrchestrator;

use super::load_config;

pub async fn run(question: String) -> Result<(), Box<dyn std::error::Error>> {
    if question.trim().is_empty() {
        return Err("Question must not be empty".into());
    }

    let config = load_config()?;
    let availability = config.availability();
    if availability.count() == 0 {
        eprintln!("  ⚠️  No provider keys configured. Run `multiflow status` for details.");
    }

    let adapters = multiflow_providers::build_from_config(&config);
    let orchestrator = PipelineOrchestrator::new(adapters, config.messages.clone());

    println!("🔀 MultiFlow");
    println!("   Question: {question}");
    println!("   {}\n", config.messages.waiting);

    let sink = |event: &StageEvent| println!("{}", render_event(event));
    let result = orchestrator.run(&question, availability, &sink).await?;

    println!("\n==============================");
    println!("{}", result.final_answer);
    if let FinalSource::Fallback { stage } = result.final_source {
        let from = stage.map(|s| s.as_str()).unwrap_or("none");
        println!("\n  (fallback answer, from {from})");
    }

    Ok(())
}

/// One line block per stage update.
fn render_event(event: &StageEvent) -> String {
    let marker = match &event.outcome {
        StageOutcome::Success(_) => "✅",
        StageOutcome::Skipped(_) => "⏭️ ",
        StageOutcome::Failed(_) => "❌",
    };
    let label = match event.stage.provider() {
        Some(provider) => format!("{} ({})", event.stage, provider.display_name()),
        None if event.stage == StageId::Final => "final".to_string(),
        None => event.stage.to_string(),
    };
    format!("{marker} {label}\n{}\n", indent(event.outcome.text()))
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_provider_and_text() {
        let event = StageEvent::new(
            "r",
            StageId::ReviewA,
            StageOutcome::Success("line one\nline two".into()),
        );
        let out = render_event(&event);
        assert!(out.starts_with("✅ reviewA (Claude)"));
        assert!(out.contains("   line one\n   line two"));
    }

    #[test]
    fn renders_final_without_provider() {
        let event = StageEvent::new("r", StageId::Final, StageOutcome::Skipped("n/a".into()));
        let out = render_event(&event);
        assert!(out.contains("final"));
        assert!(out.contains("   n/a"));
    }
}
