//! Application configuration.
//!
//! Settings come from a sparse `style-morph.toml` layered on top of stock
//! defaults; the API credential comes from the process environment.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:8000"         # Listen address for `serve`
//! public_url = "http://127.0.0.1:8000"  # Prefix for printed share links
//! max_upload_bytes = 26214400     # Request body limit (25 MiB)
//! # static_dir = "dist"           # Optional directory served for unknown paths
//!
//! [images]
//! max_dimension = 1024            # Longer edge bound for uploads (px)
//! quality = 80                    # JPEG quality (1-100)
//!
//! [generation]
//! api_base_url = "https://generativelanguage.googleapis.com"
//! caption_model = "gemini-3-flash-preview"
//! image_model = "gemini-2.5-flash-image"
//! caption_placeholder = "Output unavailable."
//! languages = ["English", "Spanish", "French", "German", "Portuguese", "Hindi", "Japanese"]
//! default_language = "English"
//!
//! [store]
//! backend = "memory"              # "memory" or "remote"
//! # remote_url = "http://127.0.0.1:8000"  # Required for "remote"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Credential
//!
//! The Gemini API key is read from `API_KEY`, falling back to
//! `GEMINI_API_KEY`. Without it generation is disabled and the web pages show
//! a configuration error instead of the capture flow.

use crate::generation::{
    DEFAULT_API_BASE_URL, DEFAULT_CAPTION_MODEL, DEFAULT_CAPTION_PLACEHOLDER, DEFAULT_IMAGE_MODEL,
};
use crate::imaging::{CompressConfig, DEFAULT_MAX_DIMENSION, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "style-morph.toml";

/// Environment variables checked for the API key, in order.
pub const CREDENTIAL_ENV_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("The Gemini API key is missing. Set the API_KEY environment variable.")]
    MissingCredential,
}

/// Application configuration loaded from `style-morph.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub images: ImagesConfig,
    pub generation: GenerationConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "images.max_dimension must be non-zero".into(),
            ));
        }
        if self.generation.languages.is_empty() {
            return Err(ConfigError::Validation(
                "generation.languages must not be empty".into(),
            ));
        }
        if !self
            .generation
            .languages
            .contains(&self.generation.default_language)
        {
            return Err(ConfigError::Validation(format!(
                "generation.default_language \"{}\" is not in generation.languages",
                self.generation.default_language
            )));
        }
        if self.store.backend == StoreBackend::Remote && self.store.remote_url.is_none() {
            return Err(ConfigError::Validation(
                "store.remote_url is required when store.backend = \"remote\"".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the service listens on.
    pub bind: String,
    /// Externally visible base URL, used when printing share links.
    pub public_url: String,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Directory of static files served for paths that are not pages or API
    /// routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            public_url: "http://127.0.0.1:8000".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            static_dir: None,
        }
    }
}

/// Upload preprocessing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Bound on the longer edge, in pixels.
    pub max_dimension: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: Quality::default().value(),
        }
    }
}

impl ImagesConfig {
    pub fn compress_config(&self) -> CompressConfig {
        CompressConfig {
            max_dimension: self.max_dimension,
            quality: Quality::new(self.quality),
        }
    }
}

/// Generation service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub api_base_url: String,
    pub caption_model: String,
    pub image_model: String,
    /// Caption stored when caption generation fails.
    pub caption_placeholder: String,
    /// Languages offered for captions.
    pub languages: Vec<String>,
    /// Language preselected in forms and used by prompt links.
    pub default_language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            caption_model: DEFAULT_CAPTION_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            caption_placeholder: DEFAULT_CAPTION_PLACEHOLDER.to_string(),
            languages: [
                "English",
                "Spanish",
                "French",
                "German",
                "Portuguese",
                "Hindi",
                "Japanese",
            ]
            .map(String::from)
            .to_vec(),
            default_language: "English".to_string(),
        }
    }
}

/// Which post store backs the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Remote,
}

/// Post store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl StoreConfig {
    /// Fail unless posts outlive this process.
    ///
    /// One-shot commands such as `create` and `show` are pointless against
    /// the memory store: it starts empty and is dropped on exit.
    pub fn require_persistent(&self, command: &str) -> Result<(), ConfigError> {
        match self.backend {
            StoreBackend::Remote => Ok(()),
            StoreBackend::Memory => Err(ConfigError::Validation(format!(
                "`{command}` needs store.backend = \"remote\"; the memory store does not outlive the command"
            ))),
        }
    }
}

// =============================================================================
// Credential
// =============================================================================

/// The Gemini API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl Credential {
    /// Read the key from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the key through `lookup`, trying each of [`CREDENTIAL_ENV_VARS`].
    /// Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        CREDENTIAL_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .map(Self)
            .ok_or(ConfigError::MissingCredential)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a sparse TOML document onto the stock defaults and validate.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: AppConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// A missing file yields the stock defaults; a present file must parse and
/// validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `style-morph.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# style-morph configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# The Gemini API key is NOT configured here: export API_KEY (or
# GEMINI_API_KEY) in the environment of the process.

# ---------------------------------------------------------------------------
# HTTP service
# ---------------------------------------------------------------------------
[server]
# Address `style-morph serve` listens on.
bind = "127.0.0.1:8000"

# Base URL printed in share links.
public_url = "http://127.0.0.1:8000"

# Largest accepted request body in bytes (uploads and JSON posts).
max_upload_bytes = 26214400

# Directory served for any path that is not a page or API route.
# static_dir = "dist"

# ---------------------------------------------------------------------------
# Upload preprocessing
# ---------------------------------------------------------------------------
[images]
# Photos are downscaled so the longer edge is at most this many pixels.
max_dimension = 1024

# JPEG quality for the re-encoded photo (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Generation service
# ---------------------------------------------------------------------------
[generation]
api_base_url = "https://generativelanguage.googleapis.com"
caption_model = "gemini-3-flash-preview"
image_model = "gemini-2.5-flash-image"

# Caption stored when caption generation fails.
caption_placeholder = "Output unavailable."

# Languages offered for captions, and the preselected one.
languages = ["English", "Spanish", "French", "German", "Portuguese", "Hindi", "Japanese"]
default_language = "English"

# ---------------------------------------------------------------------------
# Post store
# ---------------------------------------------------------------------------
[store]
# "memory": posts live as long as the process.
# "remote": posts are sent to another style-morph service (or compatible API).
backend = "memory"
# remote_url = "http://127.0.0.1:8000"
"##
}
