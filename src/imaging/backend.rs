//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the preprocessor
//! needs: identify (read intrinsic dimensions) and compress (decode, resize,
//! re-encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, everything
//! statically linked into the binary.

use super::params::CompressParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Both operations work on encoded bytes as they arrive from an upload or a
/// file, so callers never hold decoded pixels.
pub trait ImageBackend: Sync {
    /// Get image dimensions. Fails with [`BackendError::Decode`] when the
    /// bytes are not a decodable raster image.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, resize to exactly `params.width` x `params.height` and encode
    /// as JPEG.
    fn compress(&self, source: &[u8], params: &CompressParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(usize),
        Compress {
            source_len: usize,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    /// Bytes returned by [`MockBackend::compress`].
    pub const MOCK_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(source.len()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("No mock dimensions".to_string()))
        }

        fn compress(
            &self,
            source: &[u8],
            params: &CompressParams,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Compress {
                source_len: source.len(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(MOCK_JPEG.to_vec())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(b"fake").unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify(4)]);
    }

    #[test]
    fn mock_identify_without_results_is_decode_error() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(b"fake"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_records_compress() {
        let backend = MockBackend::new();

        let bytes = backend
            .compress(
                b"source",
                &CompressParams {
                    width: 1024,
                    height: 768,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert_eq!(bytes, MOCK_JPEG);
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Compress {
                source_len: 6,
                width: 1024,
                height: 768,
                quality: 80,
            }
        ));
    }
}
