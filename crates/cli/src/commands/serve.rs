//! `kbchat serve`: Start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    super::require_api_key(&config)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    tracing::debug!(?config, "Effective configuration");

    println!("📚 kbchat API");
    println!("   Listening:      {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:       {} ({})", config.default_provider, config.default_model);
    println!("   Knowledge base: {}", config.knowledge_base.path.display());
    println!("   Store:          {} at {}", config.store.backend, config.store.path.display());

    kbchat_gateway::start(config).await?;

    Ok(())
}
