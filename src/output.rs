//! CLI output formatting.
//!
//! Every entity is shown as a header line followed by indented context lines,
//! the same two-level layout for posts and for compressed images:
//!
//! ```text
//! Post k3j9x0aa
//!     Style: Oil painting
//!     Prompt: Describe the scene (English)
//!     Text: A cat wearing a crown.
//!     Original: image/jpeg, 84.2 KiB
//!     Result: image/png, 412.9 KiB
//!     URL: http://127.0.0.1:8000/id/k3j9x0aa
//!
//! Compressed 1024x768
//!     Payload: image/jpeg, 96.0 KiB
//! ```
//!
//! `format_*` functions are pure and return lines; `print_*` wrappers write
//! them to stdout.

use crate::data_uri::DataUri;
use crate::imaging::CompressedImage;
use crate::routing::post_path;
use crate::types::Post;

/// Longest generated text shown before truncation.
const MAX_TEXT_CHARS: usize = 120;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_text(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match single_line.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &single_line[..cut]),
        None => single_line,
    }
}

/// Human-readable size of a base64 payload once decoded.
fn payload_size(payload: &str) -> String {
    let bytes = payload.len() / 4 * 3;
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

fn image_line(label: &str, data_uri: &str) -> String {
    match data_uri.parse::<DataUri>() {
        Ok(uri) => format!(
            "{}{label}: {}, {}",
            indent(1),
            uri.mime_type(),
            payload_size(uri.payload())
        ),
        Err(_) => format!("{}{label}: (not a data URI)", indent(1)),
    }
}

/// Public URL of a post.
pub fn post_url(public_url: &str, id: &str) -> String {
    format!("{}{}", public_url.trim_end_matches('/'), post_path(id, None))
}

/// Format a stored post.
pub fn format_post(post: &Post, public_url: &str) -> Vec<String> {
    let mut lines = vec![format!("Post {}", post.id)];
    lines.push(format!("{}Style: {}", indent(1), post.style_prompt));
    if !post.output_prompt.is_empty() {
        lines.push(format!(
            "{}Prompt: {} ({})",
            indent(1),
            post.output_prompt,
            post.output_language
        ));
    }
    if !post.output_text.is_empty() {
        lines.push(format!(
            "{}Text: {}",
            indent(1),
            truncate_text(&post.output_text, MAX_TEXT_CHARS)
        ));
    }
    if post.is_restyled() {
        lines.push(image_line("Original", &post.original_image));
        lines.push(image_line("Result", &post.transformed_image));
    } else {
        lines.push(image_line("Image", &post.original_image));
    }
    if post.minimal_view {
        lines.push(format!("{}View: minimal", indent(1)));
    }
    lines.push(format!("{}URL: {}", indent(1), post_url(public_url, &post.id)));
    lines
}

/// Print a stored post to stdout.
pub fn print_post(post: &Post, public_url: &str) {
    for line in format_post(post, public_url) {
        println!("{}", line);
    }
}

/// Format the result of a preprocessing run.
pub fn format_compressed(image: &CompressedImage) -> Vec<String> {
    vec![
        format!("Compressed {}x{}", image.width, image.height),
        format!(
            "{}Payload: {}, {}",
            indent(1),
            image.data_uri.mime_type(),
            payload_size(image.data_uri.payload())
        ),
    ]
}

pub fn print_compressed(image: &CompressedImage) {
    for line in format_compressed(image) {
        println!("{}", line);
    }
}
