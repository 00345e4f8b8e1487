//! `multiflow direct`: Ask a single provider, outside the pipeline.

use multiflow_providers::{build_from_config, direct_router};
use std::sync::Arc;

use super::load_config;

pub async fn run(provider: String, message: String) -> Result<(), Box<dyn std::error::Error>> {
    if message.trim().is_empty() {
        return Err("Message must not be empty".into());
    }

    let config = Arc::new(load_config()?);
    let adapters = build_from_config(&config);
    let router = direct_router(config.clone(), adapters);
    tracing::debug!(provider = %provider, "Direct query");

    match router.route(&provider, &message).await {
        Ok(response) => {
            println!("{response}");
            Ok(())
        }
        Err(e) => Err(config.messages.format_error(&e).into()),
    }
}
