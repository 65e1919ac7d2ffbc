//! Application flow: photo in, stored post out.
//!
//! [`AppState`] holds the collaborators every entry point shares (the post
//! store, the optional generation service, preprocessing settings). The web
//! handlers and the `create` CLI command both go through [`AppState::create_post`].
//!
//! ```text
//! bytes ─► compress (blocking) ─► dispatch ─┬─ restyle failed ─► error, nothing saved
//!                                           └─ ok ─► Post ─► store.save
//! ```

use crate::config::{AppConfig, ConfigError, Credential, StoreBackend};
use crate::generation::{
    self, GeminiClient, GenerationError, GenerationOutcome, GenerationRequest, GenerationService,
};
use crate::imaging::{BackendError, CompressConfig, RustBackend, compress_image};
use crate::store::{HttpStore, MemoryStore, PostStore, StoreError};
use crate::types::{ORIGINAL_STYLE_LABEL, Post};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreateError {
    #[error("image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("{0}")]
    Generation(#[from] GenerationError),
    #[error("saving post failed: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Configuration(String),
    #[error("background task failed: {0}")]
    Task(String),
}

impl CreateError {
    /// Message shown next to the capture form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Imaging(_) | Self::Task(_) => "Failed to process image. Try another.".into(),
            Self::Generation(e) => e.to_string(),
            Self::Store(_) => "Failed to save. Please try again.".into(),
            Self::Configuration(msg) => msg.clone(),
        }
    }
}

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    /// `None` when no API key is configured.
    pub generator: Option<Arc<dyn GenerationService>>,
    pub images: CompressConfig,
    pub caption_placeholder: String,
    pub languages: Vec<String>,
    pub default_language: String,
}

impl AppState {
    /// State with stock settings around the given collaborators.
    pub fn new(store: Arc<dyn PostStore>, generator: Option<Arc<dyn GenerationService>>) -> Self {
        let defaults = AppConfig::default();
        Self {
            store,
            generator,
            images: defaults.images.compress_config(),
            caption_placeholder: defaults.generation.caption_placeholder,
            languages: defaults.generation.languages,
            default_language: defaults.generation.default_language,
        }
    }

    /// Wire up the store and generation client described by `config`.
    ///
    /// A missing credential leaves generation disabled rather than failing.
    pub fn from_config(config: &AppConfig, credential: Result<Credential, ConfigError>) -> Self {
        let store: Arc<dyn PostStore> = match (config.store.backend, &config.store.remote_url) {
            (StoreBackend::Remote, Some(url)) => Arc::new(HttpStore::new(url)),
            _ => Arc::new(MemoryStore::new()),
        };

        let generator: Option<Arc<dyn GenerationService>> = match credential {
            Ok(credential) => Some(Arc::new(
                GeminiClient::new(credential.expose())
                    .with_api_base_url(&config.generation.api_base_url)
                    .with_models(
                        &config.generation.caption_model,
                        &config.generation.image_model,
                    ),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "generation disabled");
                None
            }
        };

        Self {
            store,
            generator,
            images: config.images.compress_config(),
            caption_placeholder: config.generation.caption_placeholder.clone(),
            languages: config.generation.languages.clone(),
            default_language: config.generation.default_language.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Run the full creation flow for `id` and persist the result.
    ///
    /// A failed restyle aborts the flow and nothing is stored. A failed
    /// caption does not: the placeholder is stored instead.
    pub async fn create_post(
        &self,
        id: &str,
        source: Vec<u8>,
        request: &GenerationRequest,
        minimal_view: bool,
    ) -> Result<Post, CreateError> {
        let config = self.images;
        let compressed = tokio::task::spawn_blocking(move || {
            compress_image(&RustBackend::new(), &source, &config)
        })
        .await
        .map_err(|e| CreateError::Task(e.to_string()))??;
        tracing::info!(
            id,
            width = compressed.width,
            height = compressed.height,
            "photo compressed"
        );
        let original = compressed.data_uri;

        let outcome = if request.needs_service() {
            let generator = self.generator.as_deref().ok_or_else(|| {
                CreateError::Configuration(ConfigError::MissingCredential.to_string())
            })?;
            generation::dispatch(generator, &original, request, &self.caption_placeholder).await
        } else {
            GenerationOutcome {
                output_text: String::new(),
                transformed_image: Ok(original.clone()),
            }
        };
        let transformed = outcome.transformed_image?;

        let post = Post {
            id: id.to_string(),
            original_image: original.to_string(),
            transformed_image: transformed.to_string(),
            output_text: outcome.output_text,
            output_prompt: request.instruction().unwrap_or_default().to_string(),
            output_language: request.language().unwrap_or_default().to_string(),
            style_prompt: request.style().unwrap_or(ORIGINAL_STYLE_LABEL).to_string(),
            timestamp: now_millis(),
            minimal_view,
        };
        self.store.save(&post).await?;
        tracing::info!(id, restyled = post.is_restyled(), "post created");
        Ok(post)
    }

    /// Look up a post. Store failures are logged and reported as "not found".
    pub async fn load_post(&self, id: &str) -> Option<Post> {
        match self.store.get(id).await {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(id, error = %e, "loading post failed");
                None
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
