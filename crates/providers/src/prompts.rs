//! Request templates for every provider, in pipeline and direct form.
//!
//! Each builder is a pure function of its inputs; the adapters only add the
//! endpoint, credentials and wire shape.

use multiflow_core::message::{ChatRequest, Message};
use multiflow_core::provider::StageInput;
use multiflow_core::{ProviderId, StageId};

/// Temperature used by every templated call that sets one.
pub const TEMPERATURE: f64 = 0.2;

/// Claude output cap for the pipeline review.
pub const CLAUDE_REVIEW_MAX_TOKENS: u32 = 1024;

/// Claude output cap for direct questions.
pub const CLAUDE_DIRECT_MAX_TOKENS: u32 = 512;

/// Model used when the configuration does not name one.
pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Gemini => "gemini-2.0-flash",
        ProviderId::Claude => "claude-3-5-sonnet-latest",
        ProviderId::Grok => "grok-2",
        ProviderId::Perplexity => "sonar-reasoning-pro",
        ProviderId::ChatGpt => "gpt-4o-mini",
    }
}

/// The pipeline request `provider` sends for its stage.
pub fn pipeline_request(provider: ProviderId, model: &str, input: &StageInput) -> ChatRequest {
    let prior = |stage: StageId| input.get(stage).unwrap_or_default();
    let question = input.question.as_str();
    let gemini = prior(StageId::Draft);

    match provider {
        ProviderId::Gemini => ChatRequest::new(model, vec![Message::user(question)]),

        ProviderId::Claude => ChatRequest::new(
            model,
            vec![Message::user(format!(
                "Question: {question}\n\n\
                 Gemini answer:\n{gemini}\n\n\
                 Tasks:\n\
                 - Assess factual accuracy and flag issues.\n\
                 - Provide a concise corrected answer if needed.\n\
                 - Give a confidence score between 0-100.\n\
                 Respond with clear bullet points."
            ))],
        )
        .with_max_tokens(CLAUDE_REVIEW_MAX_TOKENS)
        .with_temperature(TEMPERATURE),

        ProviderId::Grok => {
            let claude = prior(StageId::ReviewA);
            ChatRequest::new(
                model,
                vec![
                    Message::system(
                        "You are Grok. Inspect the Claude review, catch critical mistakes, \
                         and refine the answer if required. Focus on insights and risks.",
                    ),
                    Message::user(format!(
                        "Question: {question}\n\n\
                         Gemini answer\n{gemini}\n\n\
                         Claude review\n{claude}\n\n\
                         Please\n\
                         1) List any omissions or errors in Claude's notes.\n\
                         2) Provide a clear correction or confirmation.\n\
                         3) Share your confidence score (0-100)."
                    )),
                ],
            )
            .with_temperature(TEMPERATURE)
        }

        ProviderId::Perplexity => {
            let claude = prior(StageId::ReviewA);
            let grok = prior(StageId::ReviewB);
            ChatRequest::new(
                model,
                vec![
                    Message::system(
                        "As Perplexity, cross-check prior model outputs, suggest helpful \
                         sources, and provide a concise summary.",
                    ),
                    Message::user(format!(
                        "Question: {question}\n\n\
                         Gemini answer:\n{gemini}\n\n\
                         Claude review:\n{claude}\n\n\
                         Grok verification:\n{grok}\n\n\
                         Summarize reliability, highlight conflicts, and suggest \
                         adjustments as short bullet points."
                    )),
                ],
            )
        }

        ProviderId::ChatGpt => {
            let claude = prior(StageId::ReviewA);
            let grok = prior(StageId::ReviewB);
            let perplexity = prior(StageId::ReviewC);
            ChatRequest::new(
                model,
                vec![
                    Message::system(
                        "You are ChatGPT. Synthesize every output, resolve inconsistencies, \
                         and present a trustworthy final answer. Return JSON with fields \
                         analysis and final.",
                    ),
                    Message::user(format!(
                        "Question: {question}\n\n\
                         Gemini answer:\n{gemini}\n\n\
                         Claude review:\n{claude}\n\n\
                         Grok verification:\n{grok}\n\n\
                         Perplexity analysis:\n{perplexity}\n\n\
                         JSON template: {{\"analysis\":\"...\", \"final\":\"...\"}}."
                    )),
                ],
            )
            .with_temperature(TEMPERATURE)
        }
    }
}

/// A single ad hoc question to `provider`.
pub fn direct_request(provider: ProviderId, model: &str, message: &str) -> ChatRequest {
    let system = match provider {
        ProviderId::Gemini => return ChatRequest::new(model, vec![Message::user(message)]),
        ProviderId::Claude => "You are Claude. Provide concise, factual answers.",
        ProviderId::Grok => {
            "You are Grok. Give clear answers and call out important warnings when needed."
        }
        ProviderId::Perplexity => {
            "You are Perplexity. Provide accurate, sourced answers when possible."
        }
        ProviderId::ChatGpt => "You are ChatGPT. Respond with a helpful and trustworthy answer.",
    };

    let request = ChatRequest::new(model, vec![Message::system(system), Message::user(message)]);
    match provider {
        ProviderId::Claude => request
            .with_max_tokens(CLAUDE_DIRECT_MAX_TOKENS)
            .with_temperature(TEMPERATURE),
        ProviderId::Perplexity => request,
        _ => request.with_temperature(TEMPERATURE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiflow_core::message::Role;

    fn full_input() -> StageInput {
        StageInput::new("Is water wet?")
            .with_prior(StageId::Draft, "G")
            .with_prior(StageId::ReviewA, "C")
            .with_prior(StageId::ReviewB, "X")
            .with_prior(StageId::ReviewC, "P")
    }

    #[test]
    fn claude_review_is_single_user_message() {
        let req = pipeline_request(ProviderId::Claude, "m", &full_input());
        assert_eq!(req.max_tokens, Some(1024));
        assert_eq!(req.temperature, Some(0.2));
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, Role::User);
        assert!(req.messages[0].content.starts_with("Question: Is water wet?\n\nGemini answer:\nG\n\nTasks:"));
        assert!(req.messages[0].content.ends_with("Respond with clear bullet points."));
    }

    #[test]
    fn grok_sees_draft_and_review_a() {
        let req = pipeline_request(ProviderId::Grok, "grok-2", &full_input());
        assert_eq!(req.messages[0].role, Role::System);
        let user = &req.messages[1].content;
        assert!(user.contains("Gemini answer\nG\n\nClaude review\nC\n\nPlease"));
        assert!(!user.contains("Grok verification"));
        assert!(user.ends_with("3) Share your confidence score (0-100)."));
    }

    #[test]
    fn perplexity_has_no_temperature() {
        let req = pipeline_request(ProviderId::Perplexity, "sonar", &full_input());
        assert_eq!(req.temperature, None);
        assert!(req.messages[1].content.contains("Grok verification:\nX"));
    }

    #[test]
    fn synthesis_carries_every_prior_output_and_template() {
        let req = pipeline_request(ProviderId::ChatGpt, "gpt", &full_input());
        let user = &req.messages[1].content;
        for part in ["Gemini answer:\nG", "Claude review:\nC", "Grok verification:\nX", "Perplexity analysis:\nP"] {
            assert!(user.contains(part), "missing {part}");
        }
        assert!(user.ends_with(r#"JSON template: {"analysis":"...", "final":"..."}."#));
        assert!(req.messages[0].content.contains("Return JSON with fields analysis and final."));
    }

    #[test]
    fn gemini_draft_is_the_bare_question() {
        let req = pipeline_request(ProviderId::Gemini, "gemini-2.0-flash", &StageInput::new("q"));
        assert_eq!(req.messages, vec![Message::user("q")]);
        assert_eq!(req.temperature, None);
    }

    #[test]
    fn direct_variants() {
        let claude = direct_request(ProviderId::Claude, "m", "hi");
        assert_eq!(claude.max_tokens, Some(512));
        assert_eq!(claude.messages[0].content, "You are Claude. Provide concise, factual answers.");

        let pplx = direct_request(ProviderId::Perplexity, "m", "hi");
        assert_eq!(pplx.temperature, None);

        let gemini = direct_request(ProviderId::Gemini, "m", "hi");
        assert_eq!(gemini.messages, vec![Message::user("hi")]);

        let gpt = direct_request(ProviderId::ChatGpt, "m", "hi");
        assert_eq!(gpt.temperature, Some(0.2));
        assert_eq!(gpt.messages[1], Message::user("hi"));
    }

    #[test]
    fn default_models() {
        assert_eq!(default_model(ProviderId::Gemini), "gemini-2.0-flash");
        assert_eq!(default_model(ProviderId::ChatGpt), "gpt-4o-mini");
    }
}
