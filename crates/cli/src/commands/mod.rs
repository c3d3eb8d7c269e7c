//! Subcommand implementations.

pub mod ask;
pub mod config_cmd;
pub mod doctor;
pub mod history;
pub mod serve;

use kbchat_config::AppConfig;
use kbchat_providers::router;

/// Load configuration, turning the error into a printable message.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Whether the default provider can be built: it has a key or runs locally.
pub fn has_credential(config: &AppConfig) -> bool {
    config.has_api_key() || router::is_local(&config.default_provider)
}

/// Fail early with setup instructions when no credential is configured.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if has_credential(config) {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured for '{}'!", config.default_provider);
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export GEMINI_API_KEY=...     (recommended)");
    eprintln!("    export KBCHAT_API_KEY=...     (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Parse a temperature argument, accepting only `0.0..=1.0`.
pub fn parse_temperature(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be between 0.0 and 1.0, got {value}"))
    }
}
