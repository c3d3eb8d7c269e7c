//! `kbchat config`: Configuration management commands.

use kbchat_config::AppConfig;

const REDACTED: &str = "***";

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings_for(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:       {}", config.default_provider);
            println!("   Model:          {}", config.default_model);
            println!("   Knowledge base: {}", config.knowledge_base.path.display());
            println!("   Store:          {}", config.store.backend);
            println!(
                "   Gateway:        {}:{}",
                config.gateway.host, config.gateway.port
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Problems that do not stop the config from loading but will break a run.
fn warnings_for(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !super::has_credential(config) {
        warnings.push(format!(
            "No API key for '{}' (set GEMINI_API_KEY or KBCHAT_API_KEY)",
            config.default_provider
        ));
    }

    if !config.knowledge_base.path.is_file() {
        warnings.push(format!(
            "Knowledge base file not found: {} (every answer will be a refusal)",
            config.knowledge_base.path.display()
        ));
    }

    if config.gateway.host == "0.0.0.0" {
        warnings.push("Gateway bound to 0.0.0.0 but the API has no authentication".into());
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

/// Copy of `config` with every credential masked.
fn redacted(mut config: AppConfig) -> AppConfig {
    if config.api_key.is_some() {
        config.api_key = Some(REDACTED.into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    config
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
