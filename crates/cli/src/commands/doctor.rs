//! `kbchat doctor`: diagnose system health.

use kbchat_config::AppConfig;
use kbchat_core::{ChatStore, Provider};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 kbchat Doctor: System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    // Config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid ({})", config_path.display());
            } else {
                println!("  ✅ No config file, using defaults and environment");
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config and run again.");
            return Ok(());
        }
    };

    // Knowledge base
    let kb = kbchat_agent::load_knowledge_base(&config.knowledge_base.path).await;
    if kb.trim().is_empty() {
        println!(
            "  ⚠️  Knowledge base empty or missing: {}",
            config.knowledge_base.path.display()
        );
        issues += 1;
    } else {
        println!("  ✅ Knowledge base loaded ({} bytes)", kb.len());
    }

    // Store
    match kbchat_store::open_from_config(&config.store).await {
        Ok(store) => match store.load_all().await {
            Ok(all) => println!(
                "  ✅ Chat store readable ({}, {} conversations)",
                store.name(),
                all.len()
            ),
            Err(e) => {
                println!("  ❌ Chat store unreadable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Chat store failed to open: {e}");
            issues += 1;
        }
    }

    // Provider
    match kbchat_providers::router::build_from_config(&config).default() {
        Some(provider) => {
            println!("  ✅ API key configured for '{}'", provider.name());
            match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider reachable"),
                Ok(false) => {
                    println!("  ⚠️  Provider responded but rejected the health check");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider unreachable: {e}");
                    issues += 1;
                }
            }
        }
        None => {
            println!(
                "  ❌ No API key for '{}': set GEMINI_API_KEY or KBCHAT_API_KEY",
                config.default_provider
            );
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
