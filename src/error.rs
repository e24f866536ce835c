//! Error types for the image store
//!
//! Every failure is classified into an explicit kind so callers can map
//! them to distinct responses instead of one generic failure. Validation
//! errors are raised before any state is mutated; storage and catalog
//! errors can surface mid-operation.

use thiserror::Error;

/// All errors produced by the product image subsystem
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// The request was rejected before any mutation
    /// (e.g. an edit that would leave a product with zero images)
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced product or image does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The uploaded bytes are not a decodable raster image
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// A variant could not be encoded or written
    #[error("failed to encode variant: {0}")]
    Encode(#[source] image::ImageError),

    /// Filesystem failure in the images directory
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Catalog database failure
    #[error("catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),

    /// Network failure while fetching an image by URL
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// A background task panicked or was cancelled
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ImageStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = ImageStoreError::Validation("a product must retain at least one image".into());
        assert!(err.to_string().contains("validation failed"));
        assert!(err.to_string().contains("at least one image"));
    }

    #[test]
    fn test_io_error_converts_to_storage() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"))?;
            Ok(())
        }
        match fails() {
            Err(ImageStoreError::Storage(_)) => {}
            other => panic!("expected Storage error, got {:?}", other),
        }
    }
}
