//! Image preprocessing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Fit** | [`calculate_fit_dimensions`] (longer edge ≤ max) |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Transport** | [`DataUri`](crate::data_uri::DataUri) with base64 payload |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_fit_dimensions;
pub use operations::{
    COMPRESSED_MIME_TYPE, CompressConfig, CompressedImage, DEFAULT_MAX_DIMENSION, compress_image,
    get_dimensions, plan_compress,
};
pub use params::{CompressParams, Quality};
pub use rust_backend::RustBackend;
