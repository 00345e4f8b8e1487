//! `multiflow providers`: List the stage bindings.

use multiflow_config::{AppConfig, KEY_ENV_VARS};
use multiflow_core::ProviderId;

use super::load_config;
use super::status::model_for;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config().unwrap_or_else(|e| {
        eprintln!("  ⚠️  {e}; showing default models");
        AppConfig::default()
    });

    println!("🤖 Pipeline Providers");
    println!("=====================");
    println!();
    for line in binding_table(&config) {
        println!("  {line}");
    }
    println!();
    println!("  Any stage without a key is skipped; the run still completes.");
    println!("  Direct queries accept: gemini, claude, grok, perplexity, chatgpt");

    Ok(())
}

fn binding_table(config: &AppConfig) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<10} {:<11} {:<24} {}",
        "Stage", "Provider", "Model", "Key variable"
    )];
    for provider in ProviderId::ALL {
        let var = KEY_ENV_VARS
            .iter()
            .find(|(p, _)| *p == provider)
            .map(|(_, v)| *v)
            .unwrap_or("-");
        lines.push(format!(
            "{:<10} {:<11} {:<24} {}",
            provider.stage().as_str(),
            provider.display_name(),
            model_for(config, provider),
            var
        ));
    }
    lines
}
