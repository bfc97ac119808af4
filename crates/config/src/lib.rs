//! Configuration loading, validation, and management for ragchat.
//!
//! Loads configuration from `~/.ragchat/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup;
//! the resulting [`AppConfig`] is read-only for the life of the process.

use ragchat_core::IdScheme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ragchat/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Vector store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding service endpoints
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Language-model runtime
    #[serde(default)]
    pub llm: LlmConfig,

    /// Request pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// HTTP server
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Settings handed to the embedded chat UI
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "chroma" (a 0.4.x or 0.5.x server speaking `/api/v1`) or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    #[serde(default = "default_store_host")]
    pub host: String,

    #[serde(default = "default_store_port")]
    pub port: u16,
}

fn default_store_backend() -> String {
    "chroma".into()
}
fn default_store_host() -> String {
    "localhost".into()
}
fn default_store_port() -> u16 {
    8000
}

impl StoreConfig {
    /// Base URL of the vector store service.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            host: default_store_host(),
            port: default_store_port(),
        }
    }
}

/// How images are turned into vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMode {
    /// The vision service returns the vector directly
    #[default]
    Embedding,
    /// The vision service returns a caption, which is embedded as text
    Caption,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_vision_url")]
    pub vision_url: String,

    #[serde(default = "default_document_url")]
    pub document_url: String,

    #[serde(default)]
    pub image_mode: ImageMode,
}

fn default_vision_url() -> String {
    "http://vision_api:5001".into()
}
fn default_document_url() -> String {
    "http://embedding_api:5002".into()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            vision_url: default_vision_url(),
            document_url: default_document_url(),
            image_mode: ImageMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_llm_url() -> String {
    "http://127.0.0.1:11434".into()
}
fn default_model() -> String {
    "llama2".into()
}
fn default_system_prompt() -> String {
    "\n# Role and Purpose:\n\n# Guidelines:\n".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Nearest records retrieved per message
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// User id applied when a request omits one
    #[serde(default = "default_user_id")]
    pub default_user_id: String,

    #[serde(default)]
    pub id_scheme: IdScheme,

    /// Store each fully embedded kind (images, documents) even when the
    /// other kind fails. The request still fails.
    #[serde(default)]
    pub store_partial_batches: bool,
}

fn default_top_n() -> usize {
    3
}
fn default_user_id() -> String {
    "admin".into()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            default_user_id: default_user_id(),
            id_scheme: IdScheme::default(),
            store_partial_batches: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Upper bound on request bodies (uploads included)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// CORS origins. Empty = any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Backend base URL the UI talks to. Empty = same origin.
    #[serde(default)]
    pub backend_base_url: String,
}

impl AppConfig {
    /// Load configuration from the default path (~/.ragchat/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, apply environment overrides, and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (highest priority).
    ///
    /// Variable names follow the deployment the services are usually run
    /// with: `CHROMA_HOST`, `CHROMA_PORT`, `VISION_API_URL`,
    /// `EMBEDDING_API_URL`, `OLLAMA_BASE_URL`, `OLLAMA_CHAT_MODEL`, `PORT`,
    /// `BACKEND_BASE_URL`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CHROMA_HOST") {
            self.store.host = host;
        }
        if let Some(port) = lookup("CHROMA_PORT") {
            self.store.port = parse_port("CHROMA_PORT", &port)?;
        }
        if let Some(url) = lookup("VISION_API_URL") {
            self.embeddings.vision_url = url;
        }
        if let Some(url) = lookup("EMBEDDING_API_URL") {
            self.embeddings.document_url = url;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_CHAT_MODEL") {
            self.llm.model = model;
        }
        if let Some(port) = lookup("PORT") {
            self.gateway.port = parse_port("PORT", &port)?;
        }
        if let Some(url) = lookup("BACKEND_BASE_URL") {
            self.ui.backend_base_url = url;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragchat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.top_n must be at least 1".into(),
            ));
        }

        if self.pipeline.default_user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.default_user_id must not be empty".into(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("llm.model must not be empty".into()));
        }

        if let Some(t) = self.llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "llm.temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        for (field, url) in [
            ("embeddings.vision_url", &self.embeddings.vision_url),
            ("embeddings.document_url", &self.embeddings.document_url),
            ("llm.base_url", &self.llm.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        match self.store.backend.as_str() {
            "chroma" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "store.backend must be 'chroma' or 'memory', got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{var} is not a valid port: '{value}'")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
