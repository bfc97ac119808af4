//! `ragchat doctor` - Check configuration and service reachability.

use ragchat_core::embedding::Embedder;
use ragchat_core::provider::ChatProvider;
use ragchat_embeddings::HttpEmbedder;
use ragchat_providers::OllamaProvider;
use std::fmt::Display;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("ragchat doctor");
    println!("==============\n");

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ok    Config valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Config invalid: {e}");
            return Err(e.into());
        }
    };

    let mut issues = 0;

    let store = ragchat_store::build_from_config(&config.store);
    issues += report(&format!("Vector store ({})", store.name()), store.health_check().await);

    let embedder = HttpEmbedder::from_config(&config.embeddings);
    issues += report("Embedding services", embedder.health_check().await);

    let provider = OllamaProvider::from_config(&config.llm);
    issues += report("Model runtime", provider.health_check().await);

    match provider.list_models().await {
        Ok(models) if model_available(&models, &config.llm.model) => {
            println!("  ok    Model '{}' available", config.llm.model);
        }
        Ok(_) => {
            println!("  WARN  Model '{}' not pulled on the runtime", config.llm.model);
            issues += 1;
        }
        Err(e) => {
            println!("  FAIL  Could not list models: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

fn report<E: Display>(what: &str, result: Result<bool, E>) -> usize {
    match result {
        Ok(true) => {
            println!("  ok    {what} reachable");
            0
        }
        Ok(false) => {
            println!("  FAIL  {what} answered with an error");
            1
        }
        Err(e) => {
            println!("  FAIL  {what} unreachable: {e}");
            1
        }
    }
}

/// Runtimes list models with a tag (`llama2:latest`); a bare name matches any tag.
fn model_available(models: &[String], model: &str) -> bool {
    models
        .iter()
        .any(|m| m == model || m.strip_prefix(model).is_some_and(|rest| rest.starts_with(':')))
}
