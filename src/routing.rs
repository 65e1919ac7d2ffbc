//! URL paths ↔ post ids.
//!
//! A post lives at `/id/<id>`. A link may also carry a free-text instruction
//! in front of the id, `/<url-encoded prompt>/id/<id>`; opening such a link
//! for an id that has no post yet starts the caption-only capture flow with
//! that prompt.
//!
//! ```text
//! /id/k3j9x0aa                     → Route::Post     { id }
//! /Describe%20the%20mood/id/k3j9   → Route::Prompted { prompt, id }
//! /  or  /anything/else            → Route::Missing  → fresh id, /id/<new>
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Literal segment that precedes the id.
pub const ID_MARKER: &str = "id";

/// Bytes escaped when text becomes a single path segment: everything except
/// the RFC 3986 unreserved characters.
pub const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode `text` so it occupies exactly one path segment.
pub fn encode_segment(text: &str) -> String {
    utf8_percent_encode(text, PATH_SEGMENT).to_string()
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Post { id: String },
    Prompted { prompt: String, id: String },
    Missing,
}

impl Route {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Post { id } | Self::Prompted { id, .. } => Some(id),
            Self::Missing => None,
        }
    }
}

/// Parse a URL path (without query string) into a route.
///
/// Both the prompt and the id are percent-decoded, so the id matches the key
/// the JSON API extracts from `/api/posts/{id}`.
pub fn parse_route(path: &str) -> Route {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match parts.as_slice() {
        [prompt, ID_MARKER, id, ..] => Route::Prompted {
            prompt: decode_segment(prompt),
            id: decode_segment(id),
        },
        [ID_MARKER, id, ..] => Route::Post {
            id: decode_segment(id),
        },
        _ => Route::Missing,
    }
}

/// What to show for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path names an id; look it up.
    Existing(Route),
    /// No id in the path: a new one was minted and the address should be
    /// replaced, without a history entry, by `replace_with`.
    Fresh { id: String, replace_with: String },
}

impl Resolution {
    pub fn id(&self) -> &str {
        match self {
            Self::Existing(route) => route.id().unwrap_or_default(),
            Self::Fresh { id, .. } => id,
        }
    }
}

/// Resolve a path, minting a new id with `make_id` when the path has none.
pub fn resolve(path: &str, make_id: impl FnOnce() -> String) -> Resolution {
    match parse_route(path) {
        Route::Missing => {
            let id = make_id();
            let replace_with = post_path(&id, None);
            Resolution::Fresh { id, replace_with }
        }
        route => Resolution::Existing(route),
    }
}

/// Path of a post, optionally carrying a prompt segment.
pub fn post_path(id: &str, prompt: Option<&str>) -> String {
    let id = encode_segment(id);
    match prompt {
        Some(prompt) => format!("/{}/{ID_MARKER}/{id}", encode_segment(prompt)),
        None => format!("/{ID_MARKER}/{id}"),
    }
}
