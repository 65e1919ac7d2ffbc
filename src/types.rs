//! Shared types persisted by the store and sent over the wire.
//!
//! A [`Post`] is serialized with camelCase field names so the same JSON is
//! accepted by the HTTP service, the remote store client, and any browser
//! front end that embeds the images directly.

use serde::{Deserialize, Serialize};

/// Style label recorded when no restyle ran and the original image is shown.
pub const ORIGINAL_STYLE_LABEL: &str = "Original";

/// One photo plus everything generated for it.
///
/// Records are immutable once created. Re-creating a post under the same id
/// replaces the stored record; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Short opaque id, also the URL segment.
    pub id: String,
    /// Compressed source photo as a data URI.
    pub original_image: String,
    /// Restyled photo as a data URI (the original when no restyle ran).
    pub transformed_image: String,
    /// Generated caption, or the placeholder when captioning failed.
    pub output_text: String,
    /// Instruction the caption was generated from.
    pub output_prompt: String,
    /// Language the caption was requested in.
    pub output_language: String,
    /// Style description used for the restyle.
    pub style_prompt: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
    /// Display preference: show only the result, without the original.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub minimal_view: bool,
}

impl Post {
    /// Whether the post carries a restyled image rather than the original.
    ///
    /// Decided by the images, not the style label: a style typed as
    /// "Original" is still a restyle.
    pub fn is_restyled(&self) -> bool {
        self.transformed_image != self.original_image
    }
}
