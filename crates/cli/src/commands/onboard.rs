//! `multiflow onboard`: First-time setup.

use multiflow_config::{AppConfig, KEY_ENV_VARS};
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();

    println!("🔀 MultiFlow — First-Time Setup");
    println!("===============================\n");

    if write_default_config(&config_path)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Add your API keys to {}", config_path.display());
        println!("      or export them:");
        for (_, var) in KEY_ENV_VARS {
            println!("        {var}");
        }
        println!("   2. Run: multiflow status");
        println!("   3. Run: multiflow ask \"your question\"\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    }

    Ok(())
}

/// Write the default config unless one exists. Returns whether a file was written.
fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
