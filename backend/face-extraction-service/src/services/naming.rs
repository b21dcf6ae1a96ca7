//! Naming and eligibility rules for derived face objects
//!
//! Derived keys are a pure function of the source key and the face index, so
//! reprocessing a source overwrites the same crops instead of adding new ones.

use crate::error::{ExtractionError, Result};
use crate::models::{DerivedObjectRef, SourceObjectRef};

/// Substring that marks an object as a face crop
pub const DERIVED_MARKER: &str = "_face_";

/// Source suffixes that trigger processing (case-sensitive)
pub const IMAGE_SUFFIXES: [&str; 2] = [".jpg", ".png"];

/// Whether a notified key should be processed at all.
///
/// Crops are stored in the same bucket as their source, so keys carrying the
/// marker are rejected to stop them from re-triggering extraction.
pub fn is_eligible(key: &str) -> bool {
    IMAGE_SUFFIXES.iter().any(|suffix| key.ends_with(suffix)) && !key.contains(DERIVED_MARKER)
}

/// Key of the `index`-th face crop: `<base>_face_<index>.<ext>`,
/// split at the last `.` of the source key.
pub fn derived_key(source_key: &str, index: usize) -> Result<String> {
    let (base, ext) = source_key.rsplit_once('.').ok_or_else(|| {
        ExtractionError::InvalidKey(format!("no extension separator in '{}'", source_key))
    })?;

    Ok(format!("{}{}{}.{}", base, DERIVED_MARKER, index, ext))
}

/// Derived object reference in the source bucket
pub fn derived_ref(source: &SourceObjectRef, index: usize) -> Result<DerivedObjectRef> {
    Ok(DerivedObjectRef {
        bucket: source.bucket.clone(),
        key: derived_key(&source.key, index)?,
    })
}
