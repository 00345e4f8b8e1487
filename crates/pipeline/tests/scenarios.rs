//! End-to-end runs over the real adapters and a scripted transport.

use multiflow_config::AppConfig;
use multiflow_core::{FinalSource, ProviderId, StageEvent, StageId, StageOutcome};
use multiflow_pipeline::PipelineOrchestrator;
use multiflow_providers::build_adapters;
use multiflow_providers::testing::ScriptedTransport;
use std::sync::{Arc, Mutex};

fn config_with(providers: &[ProviderId]) -> AppConfig {
    let mut config = AppConfig::default();
    for id in providers {
        config.providers.get_mut(*id).api_key = Some(format!("{id}-key"));
    }
    config
}

fn completion(content: &str) -> String {
    serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
        .to_string()
}

fn gemini(text: &str) -> String {
    serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
}

fn claude(text: &str) -> String {
    serde_json::json!({"content": [{"type": "text", "text": text}]}).to_string()
}

fn user_content(body: &serde_json::Value) -> String {
    let messages = body["messages"].as_array().unwrap();
    messages
        .iter()
        .find(|m| m["role"] == "user")
        .and_then(|m| m["content"].as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn all_providers_answer() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(ProviderId::Gemini, 200, &gemini("Paris is the capital of France."))
            .reply(ProviderId::Claude, 200, &claude("- Correct.\n- Confidence: 98"))
            .reply(ProviderId::Grok, 200, &completion("Confirmed, no omissions."))
            .reply(ProviderId::Perplexity, 200, &completion("Reliable; see Britannica."))
            .reply(
                ProviderId::ChatGpt,
                200,
                &completion(r#"{"analysis":"All reviewers agree.","final":"Paris."}"#),
            ),
    );
    let config = config_with(&ProviderId::ALL);
    let orchestrator = PipelineOrchestrator::new(
        build_adapters(&config, transport.clone()),
        config.messages.clone(),
    );

    let events = Mutex::new(Vec::new());
    let sink = |e: &StageEvent| events.lock().unwrap().push(e.stage);
    let result = orchestrator
        .run("What is the capital of France?", config.availability(), &sink)
        .await
        .unwrap();

    assert_eq!(result.final_answer, "Paris.");
    assert_eq!(result.final_source, FinalSource::Synthesis);
    assert_eq!(
        result.outcome(StageId::Synthesis),
        Some(&StageOutcome::Success("All reviewers agree.".into()))
    );
    assert_eq!(transport.providers_called(), ProviderId::ALL.to_vec());
    assert_eq!(*events.lock().unwrap(), StageId::ORDER.to_vec());

    // Cumulative context reaches each reviewer
    let claude_body = &transport.requests_for(ProviderId::Claude)[0].body;
    assert!(user_content(claude_body).contains("Gemini answer:\nParis is the capital of France."));

    let grok_user = user_content(&transport.requests_for(ProviderId::Grok)[0].body);
    assert!(grok_user.contains("Claude review\n- Correct.\n- Confidence: 98"));

    let pplx_user = user_content(&transport.requests_for(ProviderId::Perplexity)[0].body);
    assert!(pplx_user.contains("Grok verification:\nConfirmed, no omissions."));

    let gpt_user = user_content(&transport.requests_for(ProviderId::ChatGpt)[0].body);
    assert!(gpt_user.contains("Perplexity analysis:\nReliable; see Britannica."));

    let display = result.display();
    assert_eq!(display.last(), Some(&(StageId::Final, "Paris.")));
}

#[tokio::test]
async fn only_draft_and_review_a_configured() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(ProviderId::Gemini, 200, &gemini("Draft answer."))
            .reply(ProviderId::Claude, 200, &claude("Reviewed answer.")),
    );
    let config = config_with(&[ProviderId::Gemini, ProviderId::Claude]);
    let orchestrator = PipelineOrchestrator::new(
        build_adapters(&config, transport.clone()),
        config.messages.clone(),
    );

    let result = orchestrator
        .run("q", config.availability(), &multiflow_core::NoopSink)
        .await
        .unwrap();

    for stage in [StageId::ReviewB, StageId::ReviewC, StageId::Synthesis] {
        assert_eq!(
            result.outcome(stage),
            Some(&StageOutcome::Skipped(config.messages.skip.clone()))
        );
    }
    assert_eq!(result.final_answer, "Reviewed answer.");
    assert_eq!(
        result.final_source,
        FinalSource::Fallback { stage: Some(StageId::ReviewA) }
    );
    assert_eq!(
        transport.providers_called(),
        vec![ProviderId::Gemini, ProviderId::Claude]
    );
}

#[tokio::test]
async fn draft_unauthorized_does_not_stop_review() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(
                ProviderId::Gemini,
                401,
                r#"{"error":{"code":401,"message":"API key not valid. Please pass a valid API key."}}"#,
            )
            .reply(ProviderId::Claude, 200, &claude("The draft is an error message.")),
    );
    let config = config_with(&[ProviderId::Gemini, ProviderId::Claude]);
    let orchestrator = PipelineOrchestrator::new(
        build_adapters(&config, transport.clone()),
        config.messages.clone(),
    );

    let result = orchestrator
        .run("q", config.availability(), &multiflow_core::NoopSink)
        .await
        .unwrap();

    let draft_error = "error: Gemini 401 - API key not valid. Please pass a valid API key.";
    assert_eq!(
        result.outcome(StageId::Draft),
        Some(&StageOutcome::Failed(draft_error.into()))
    );

    let claude_user = user_content(&transport.requests_for(ProviderId::Claude)[0].body);
    assert!(claude_user.contains(&format!("Gemini answer:\n{draft_error}")));
    assert_eq!(result.final_answer, "The draft is an error message.");
}

#[tokio::test]
async fn transport_failure_is_recorded_on_its_stage() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .reply(ProviderId::Gemini, 200, &gemini("d"))
            .fail(ProviderId::Claude, "operation timed out")
            .reply(ProviderId::Grok, 200, &completion("g"))
            .reply(ProviderId::Perplexity, 200, "<html>not json</html>")
            .reply(ProviderId::ChatGpt, 200, &completion("Some reasoning.\nFinal: d")),
    );
    let config = config_with(&ProviderId::ALL);
    let orchestrator = PipelineOrchestrator::new(
        build_adapters(&config, transport.clone()),
        config.messages.clone(),
    );

    let result = orchestrator
        .run("q", config.availability(), &multiflow_core::NoopSink)
        .await
        .unwrap();

    assert_eq!(
        result.outcome(StageId::ReviewA).unwrap().text(),
        "error: Claude request failed: operation timed out"
    );
    assert_eq!(
        result.outcome(StageId::ReviewC).unwrap().text(),
        "error: Perplexity response could not be parsed as JSON"
    );
    assert_eq!(
        result.outcome(StageId::Synthesis).unwrap().text(),
        "Some reasoning.\nFinal: d"
    );
    assert_eq!(result.final_answer, "d");
    assert_eq!(transport.calls(), 5);
}
