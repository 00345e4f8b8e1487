pub mod ask;
pub mod direct;
pub mod onboard;
pub mod providers;
pub mod serve;
pub mod status;

use multiflow_config::AppConfig;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}
