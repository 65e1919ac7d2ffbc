//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which decides the target size, and the
//! [`backend`](super::backend), which does the pixel work. Tests swap in a
//! recording backend without touching operation logic.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`CompressParams`]: target dimensions and quality for one re-encode.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a decode → resize → JPEG encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
