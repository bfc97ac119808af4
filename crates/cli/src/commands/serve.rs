//! `ragchat serve` - Start the HTTP gateway.

use std::path::Path;

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("ragchat gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Store:      {} ({})", config.store.backend, config.store.url());
    println!("   Model:      {} @ {}", config.llm.model, config.llm.base_url);

    tracing::info!(
        top_n = config.pipeline.top_n,
        image_mode = ?config.embeddings.image_mode,
        "Starting gateway"
    );
    ragchat_gateway::start(config).await?;

    Ok(())
}
