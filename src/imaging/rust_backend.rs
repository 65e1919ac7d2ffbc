//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//!
//! JPEG has no alpha channel, so pixels are flattened to RGB8 before encoding.
//!
//! Phone cameras store portrait shots as landscape pixels plus an Orientation
//! tag. Both operations report and produce the upright image; the tag itself
//! is not written to the output.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::CompressParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("failed to guess format: {e}")))
}

fn decoder(source: &[u8]) -> Result<impl ImageDecoder + '_, BackendError> {
    reader(source)?
        .into_decoder()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Orientation recorded in the file; missing or unreadable metadata means none.
fn read_orientation(decoder: &mut impl ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

/// Whether applying `orientation` swaps width and height.
fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Decode an in-memory image and turn it upright.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    let mut decoder = decoder(source)?;
    let orientation = read_orientation(&mut decoder);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Encode as baseline JPEG.
fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality as u8);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(buf.into_inner())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let mut decoder = decoder(source)?;
        let (width, height) = decoder.dimensions();
        if swaps_axes(read_orientation(&mut decoder)) {
            Ok(Dimensions {
                width: height,
                height: width,
            })
        } else {
            Ok(Dimensions { width, height })
        }
    }

    fn compress(&self, source: &[u8], params: &CompressParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(source)?;
        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        encode_jpeg(&resized, params.quality.value())
    }
}
