//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::{CompressParams, Quality};
use crate::data_uri::DataUri;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Media type of every compressed image.
pub const COMPRESSED_MIME_TYPE: &str = "image/jpeg";

/// Default bound on the longer edge of an uploaded photo.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Configuration for upload compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressConfig {
    pub max_dimension: u32,
    pub quality: Quality,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: Quality::default(),
        }
    }
}

/// A size-bounded, re-encoded photo ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub data_uri: DataUri,
    pub width: u32,
    pub height: u32,
}

/// Plan a compression pass without executing it.
pub fn plan_compress(original: (u32, u32), config: &CompressConfig) -> CompressParams {
    let (width, height) = calculate_fit_dimensions(original, config.max_dimension);
    CompressParams {
        width,
        height,
        quality: config.quality,
    }
}

/// Downscale a photo so its longer edge fits `max_dimension`, re-encode it as
/// JPEG and wrap the bytes in a data URI.
///
/// Fails with [`BackendError::Decode`] when the input is not an image.
pub fn compress_image(
    backend: &impl ImageBackend,
    source: &[u8],
    config: &CompressConfig,
) -> Result<CompressedImage> {
    let original = get_dimensions(backend, source)?;
    let params = plan_compress(original, config);
    let encoded = backend.compress(source, &params)?;

    Ok(CompressedImage {
        data_uri: DataUri::from_bytes(COMPRESSED_MIME_TYPE, &encoded),
        width: params.width,
        height: params.height,
    })
}
