//! Generation service boundary: captioning and restyling a photo.
//!
//! What to run is decided exactly once, when user input becomes a
//! [`GenerationRequest`]; [`dispatch`] is the only place that acts on it.
//!
//! ```text
//! style   caption   →  request
//! ─────   ───────      ──────────────────────
//!   ✓        ✓         Both          (issued concurrently)
//!   ✓        ·         StyleOnly
//!   ·        ✓         CaptionOnly   (original shown as result)
//!   ·        ·         PassthroughOriginal
//! ```
//!
//! The two remote calls are joined independently. A caption failure degrades
//! to a placeholder; a restyle failure is handed back to the caller together
//! with whatever caption was produced. Nothing is retried and no timeout is
//! applied.

mod gemini;

pub use gemini::{
    DEFAULT_API_BASE_URL, DEFAULT_CAPTION_MODEL, DEFAULT_IMAGE_MODEL, GeminiClient, caption_prompt,
    restyle_prompt,
};

use crate::data_uri::DataUri;
use async_trait::async_trait;
use thiserror::Error;

/// Caption used when caption generation fails.
pub const DEFAULT_CAPTION_PLACEHOLDER: &str = "Output unavailable.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation service returned no text")]
    EmptyResponse,
    #[error("No image generated in response")]
    NoImage,
    #[error("failed to decode generation response: {0}")]
    Decode(String),
}

/// Remote captioning and restyling.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Describe `image` following `instruction`, answering in `language`.
    async fn caption(
        &self,
        image: &DataUri,
        instruction: &str,
        language: &str,
    ) -> Result<String, GenerationError>;

    /// Redraw `image` in the given style.
    async fn restyle(&self, image: &DataUri, style: &str) -> Result<DataUri, GenerationError>;
}

/// Which generation sub-flows to run, built once from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    StyleOnly {
        style: String,
    },
    CaptionOnly {
        instruction: String,
        language: String,
    },
    Both {
        style: String,
        instruction: String,
        language: String,
    },
    PassthroughOriginal,
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl GenerationRequest {
    /// Build a request from raw form input. Blank prompts count as absent.
    pub fn from_prompts(style: &str, instruction: &str, language: &str) -> Self {
        let language = language.trim().to_string();
        match (non_blank(style), non_blank(instruction)) {
            (Some(style), Some(instruction)) => Self::Both {
                style,
                instruction,
                language,
            },
            (Some(style), None) => Self::StyleOnly { style },
            (None, Some(instruction)) => Self::CaptionOnly {
                instruction,
                language,
            },
            (None, None) => Self::PassthroughOriginal,
        }
    }

    pub fn style(&self) -> Option<&str> {
        match self {
            Self::StyleOnly { style } | Self::Both { style, .. } => Some(style),
            _ => None,
        }
    }

    pub fn instruction(&self) -> Option<&str> {
        match self {
            Self::CaptionOnly { instruction, .. } | Self::Both { instruction, .. } => {
                Some(instruction)
            }
            _ => None,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            Self::CaptionOnly { language, .. } | Self::Both { language, .. } => Some(language),
            _ => None,
        }
    }

    /// Whether running this request needs the remote service at all.
    pub fn needs_service(&self) -> bool {
        !matches!(self, Self::PassthroughOriginal)
    }
}

/// Joined result of one dispatch.
#[derive(Debug)]
pub struct GenerationOutcome {
    /// Caption, the placeholder when captioning failed, or empty when no
    /// caption was requested.
    pub output_text: String,
    /// Restyled image, the original when no restyle was requested, or the
    /// restyle failure.
    pub transformed_image: Result<DataUri, GenerationError>,
}

async fn caption_or_placeholder(
    service: &dyn GenerationService,
    image: &DataUri,
    instruction: &str,
    language: &str,
    placeholder: &str,
) -> String {
    match service.caption(image, instruction, language).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "caption generation failed, using placeholder");
            placeholder.to_string()
        }
    }
}

async fn restyle_logged(
    service: &dyn GenerationService,
    image: &DataUri,
    style: &str,
) -> Result<DataUri, GenerationError> {
    service.restyle(image, style).await.inspect_err(|e| {
        tracing::error!(error = %e, "image restyle failed");
    })
}

/// Run the sub-flows selected by `request` against `image`.
pub async fn dispatch(
    service: &dyn GenerationService,
    image: &DataUri,
    request: &GenerationRequest,
    placeholder: &str,
) -> GenerationOutcome {
    match request {
        GenerationRequest::Both {
            style,
            instruction,
            language,
        } => {
            let (output_text, transformed_image) = tokio::join!(
                caption_or_placeholder(service, image, instruction, language, placeholder),
                restyle_logged(service, image, style),
            );
            GenerationOutcome {
                output_text,
                transformed_image,
            }
        }
        GenerationRequest::StyleOnly { style } => GenerationOutcome {
            output_text: String::new(),
            transformed_image: restyle_logged(service, image, style).await,
        },
        GenerationRequest::CaptionOnly {
            instruction,
            language,
        } => GenerationOutcome {
            output_text: caption_or_placeholder(service, image, instruction, language, placeholder)
                .await,
            transformed_image: Ok(image.clone()),
        },
        GenerationRequest::PassthroughOriginal => GenerationOutcome {
            output_text: String::new(),
            transformed_image: Ok(image.clone()),
        },
    }
}
