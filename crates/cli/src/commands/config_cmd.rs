//! `ragchat config` - Print the effective configuration.

use std::path::Path;

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", super::config_file(config_path).display());
    println!("{toml_str}");
    Ok(())
}
