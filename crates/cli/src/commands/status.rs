//! `multiflow status`: Show which stages can run.

use multiflow_config::AppConfig;
use multiflow_core::ProviderId;
use multiflow_providers::prompts::default_model;

use super::load_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let availability = config.availability();

    println!("🔀 MultiFlow Status");
    println!("==================");
    println!("  Config:       {}", AppConfig::config_path().display());
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  HTTP timeout: {}s", config.http.timeout_secs);
    println!();

    for provider in ProviderId::ALL {
        let mark = if availability.has(provider.capability()) {
            "✅"
        } else {
            "❌"
        };
        println!(
            "  {mark} {:<10} {:<11} {}",
            provider.stage().as_str(),
            provider.display_name(),
            model_for(&config, provider)
        );
    }

    if config.providers.xai.team_id().is_some() {
        println!("\n  xAI team id configured");
    }

    if !AppConfig::config_path().exists() {
        println!("\n  ⚠️  No config file, run `multiflow onboard` first");
    }

    Ok(())
}

pub(crate) fn model_for(config: &AppConfig, provider: ProviderId) -> &str {
    config
        .providers
        .get(provider)
        .model
        .as_deref()
        .unwrap_or(default_model(provider))
}
