//! `ragchat status` - Show the effective configuration.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let ui_backend = if config.ui.backend_base_url.is_empty() {
        "(same origin)"
    } else {
        config.ui.backend_base_url.as_str()
    };

    println!("ragchat status");
    println!("==============");
    println!("  Config file:    {}", super::config_file(config_path).display());
    println!("  Store:          {} ({})", config.store.backend, config.store.url());
    println!("  Vision API:     {}", config.embeddings.vision_url);
    println!("  Embedding API:  {}", config.embeddings.document_url);
    println!("  Image mode:     {:?}", config.embeddings.image_mode);
    println!("  Model runtime:  {}", config.llm.base_url);
    println!("  Model:          {}", config.llm.model);
    println!("  Top N:          {}", config.pipeline.top_n);
    println!("  Default user:   {}", config.pipeline.default_user_id);
    println!("  Id scheme:      {:?}", config.pipeline.id_scheme);
    println!("  Gateway:        {}:{}", config.gateway.host, config.gateway.port);
    println!("  UI backend:     {ui_backend}");

    if super::config_file(config_path).exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, running on defaults and environment");
    }

    Ok(())
}
