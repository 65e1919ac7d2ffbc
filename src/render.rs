//! HTML pages, rendered with Maud.
//!
//! Every page is a full document: a post view, the creation form, the
//! prompt-capture form, or the configuration error. Forms post back to their
//! own URL as `multipart/form-data`, so the pages work without JavaScript.

use crate::routing::post_path;
use crate::types::Post;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS: &str = include_str!("../static/style.css");

/// Application title shown in the header and `<title>`.
pub const APP_TITLE: &str = "Gemini Style Morph";

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                header.site-header {
                    h1 { (APP_TITLE) }
                    a href="/" { "New" }
                }
                main { (content) }
            }
        }
    }
}

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = error {
            div.error role="alert" { (message) }
        }
    }
}

fn photo_input() -> Markup {
    html! {
        div.panel {
            label.label for="image" { "Photo" }
            input #image type="file" name="image" accept="image/*" capture="environment" required;
        }
    }
}

/// A stored post. Minimal posts show only the result and its text.
pub fn render_post_page(post: &Post) -> Markup {
    let content = html! {
        div.result {
            img src=(post.transformed_image) alt="Transformed";
        }
        @if !post.minimal_view && post.is_restyled() {
            span.style-tag { "Style: " (post.style_prompt) }
        }
        @if !post.output_text.is_empty() {
            p.output-text { (post.output_text) }
        }
        @if !post.minimal_view && post.is_restyled() {
            div.original {
                span.label { "Original Source" }
                img src=(post.original_image) alt="Original";
            }
        }
    };
    base_document(APP_TITLE, content)
}

/// The full creation form for an unused id.
pub fn render_create_page(
    id: &str,
    languages: &[String],
    selected_language: &str,
    error: Option<&str>,
) -> Markup {
    let content = html! {
        div.intro {
            h2 { "Create Magic" }
            p { "Capture a moment, give it a style." }
        }
        form method="post" action=(post_path(id, None)) enctype="multipart/form-data" {
            (photo_input())
            div.panel {
                label.label for="style_prompt" { "Style" }
                textarea #style_prompt name="style_prompt"
                    placeholder="Describe the style (e.g., 'Cyberpunk city', 'Oil painting by Van Gogh', 'Made of Lego')" {}
            }
            div.panel {
                label.label for="output_language" { "Language" }
                select #output_language name="output_language" {
                    @for language in languages {
                        option value=(language) selected[language == selected_language] { (language) }
                    }
                }
            }
            div.panel {
                label.label for="output_prompt" { "Text" }
                textarea #output_prompt name="output_prompt"
                    placeholder="Tell Gemini how to write the text (e.g., 'Sarcastically describe the scene', 'Write a short plot for this scene')" {}
            }
            (error_banner(error))
            button type="submit" { "Transform Reality" }
        }
    };
    base_document(APP_TITLE, content)
}

/// The caption-only capture form for a prompt link.
pub fn render_prompt_page(id: &str, prompt: &str, error: Option<&str>) -> Markup {
    let content = html! {
        div.intro {
            h2 { "Quick Capture" }
            p { "Take a photo to generate content" }
        }
        div.panel {
            span.label { "Prompt" }
            p { (prompt) }
        }
        form method="post" action=(post_path(id, Some(prompt))) enctype="multipart/form-data" {
            (photo_input())
            (error_banner(error))
            button type="submit" { "Generate" }
        }
    };
    base_document(APP_TITLE, content)
}

/// Shown instead of every page when no API key is configured.
pub fn render_config_error_page() -> Markup {
    let content = html! {
        div.config-error {
            h1 { "Configuration Error" }
            p {
                "The Google Gemini API Key is missing. Please ensure the "
                code { "API_KEY" }
                " environment variable is set."
            }
        }
    };
    base_document("Configuration Error", content)
}
