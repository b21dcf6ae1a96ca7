/// Error types for Face Extraction Service
///
/// Every failure that can happen while processing a single notification maps
/// onto one of these variants. They are captured per message by the batch
/// processor and never escape the trigger handler.
use thiserror::Error;

/// Result type for face-extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Pipeline error taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Source object missing or unreadable from the object store
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Detection call failed, timed out, or returned a non-success status
    #[error("Detection error: {0}")]
    Detection(String),

    /// Source bytes are not a decodable raster image
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Face rectangle lies outside the image
    #[error("Crop bounds error: {0}")]
    CropBounds(String),

    /// Writing a derived object or publishing a notification failed
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// Source key has no extension separator
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A worker task died before producing a result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractionError {
    /// Stable label used in logs, metrics and outcome records
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Fetch(_) => "fetch_error",
            ExtractionError::Detection(_) => "detection_error",
            ExtractionError::ImageDecode(_) => "image_decode_error",
            ExtractionError::CropBounds(_) => "crop_bounds_error",
            ExtractionError::StoreWrite(_) => "store_write_error",
            ExtractionError::InvalidKey(_) => "invalid_key_error",
            ExtractionError::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_distinct() {
        let errors = [
            ExtractionError::Fetch(String::new()),
            ExtractionError::Detection(String::new()),
            ExtractionError::ImageDecode(String::new()),
            ExtractionError::CropBounds(String::new()),
            ExtractionError::StoreWrite(String::new()),
            ExtractionError::InvalidKey(String::new()),
            ExtractionError::Internal(String::new()),
        ];
        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_display_includes_message() {
        let err = ExtractionError::Detection("status 403".to_string());
        assert_eq!(err.to_string(), "Detection error: status 403");
    }
}
