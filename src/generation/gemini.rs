//! Gemini `generateContent` client.
//!
//! Both operations send one content block holding the photo as an
//! `inlineData` part followed by a text instruction:
//!
//! ```text
//! POST {base}/v1beta/models/{model}:generateContent
//! x-goog-api-key: <key>
//!
//! {"contents":[{"parts":[
//!     {"inlineData":{"mimeType":"image/jpeg","data":"<base64>"}},
//!     {"text":"..."}
//! ]}]}
//! ```
//!
//! Captions are the concatenated text parts of the first candidate. Restyled
//! images are the first `inlineData` part of the first candidate.

use super::{GenerationError, GenerationService};
use crate::data_uri::{DataUri, strip_data_uri_prefix};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CAPTION_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Instruction text sent alongside the photo for captioning.
pub fn caption_prompt(instruction: &str, language: &str) -> String {
    format!(
        "Follow this instruction for the image content: \"{instruction}\". Respond in {language}. Keep it under 200 words."
    )
}

/// Instruction text sent alongside the photo for restyling.
pub fn restyle_prompt(style: &str) -> String {
    format!("Redesign this image in the style of \"{style}\".")
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

fn image_and_text(image: &DataUri, text: String) -> Content {
    let mime_type = if image.mime_type().is_empty() {
        crate::imaging::COMPRESSED_MIME_TYPE.to_string()
    } else {
        image.mime_type().to_string()
    };
    Content {
        parts: vec![
            Part {
                inline_data: Some(InlineData {
                    mime_type,
                    data: strip_data_uri_prefix(image.payload()).to_string(),
                }),
                ..Part::default()
            },
            Part {
                text: Some(text),
                ..Part::default()
            },
        ],
    }
}

fn caption_request(image: &DataUri, instruction: &str, language: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![image_and_text(image, caption_prompt(instruction, language))],
        generation_config: None,
    }
}

fn restyle_request(image: &DataUri, style: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![image_and_text(image, restyle_prompt(style))],
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
        }),
    }
}

fn first_candidate_parts(response: &GenerateContentResponse) -> &[Part] {
    response
        .candidates
        .first()
        .map(|c| c.content.parts.as_slice())
        .unwrap_or_default()
}

fn extract_text(response: &GenerateContentResponse) -> Result<String, GenerationError> {
    let text: String = first_candidate_parts(response)
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

fn extract_image(response: &GenerateContentResponse) -> Result<DataUri, GenerationError> {
    first_candidate_parts(response)
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| !d.data.is_empty())
        .map(|d| DataUri::new(d.mime_type.clone(), d.data.clone()))
        .ok_or(GenerationError::NoImage)
}

// ============================================================================
// Client
// ============================================================================

/// Gemini REST client implementing [`GenerationService`].
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base_url: String,
    api_key: String,
    caption_model: String,
    image_model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base_url", &self.api_base_url)
            .field("caption_model", &self.caption_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: api_key.into(),
            caption_model: DEFAULT_CAPTION_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.api_base_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, caption: impl Into<String>, image: impl Into<String>) -> Self {
        self.caption_model = caption.into();
        self.image_model = image.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, model
        )
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        tracing::info!(model, "calling generateContent");
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn caption(
        &self,
        image: &DataUri,
        instruction: &str,
        language: &str,
    ) -> Result<String, GenerationError> {
        let request = caption_request(image, instruction, language);
        let response = self.generate(&self.caption_model, &request).await?;
        extract_text(&response)
    }

    async fn restyle(&self, image: &DataUri, style: &str) -> Result<DataUri, GenerationError> {
        let request = restyle_request(image, style);
        let response = self.generate(&self.image_model, &request).await?;
        extract_image(&response)
    }
}
