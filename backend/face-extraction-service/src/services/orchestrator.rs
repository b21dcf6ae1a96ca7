//! Extraction orchestrator - per-object face extraction workflow
//!
//! This service handles the complete extraction workflow for one source image:
//! 1. Download the source image and base64-encode it
//! 2. Detect faces
//! 3. For each face in detector order: derive the key, crop, upload
//! 4. Return the derived objects
//!
//! Queue publishing is left to the batch processor.

use super::cropper::FaceCropper;
use super::detector::FaceDetector;
use super::naming::derived_ref;
use super::storage::{fetch_source, publish_crop, ObjectStore};
use crate::error::Result;
use crate::metrics;
use crate::models::{ExtractionResult, SourceObjectRef};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct ExtractionOrchestrator {
    store: Arc<dyn ObjectStore>,
    detector: Arc<dyn FaceDetector>,
    cropper: Arc<FaceCropper>,
}

impl ExtractionOrchestrator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        detector: Arc<dyn FaceDetector>,
        cropper: Arc<FaceCropper>,
    ) -> Self {
        Self {
            store,
            detector,
            cropper,
        }
    }

    /// Extract every detected face of `source` into its own object.
    ///
    /// A successful detection with no faces yields an empty result; nothing is
    /// decoded or written in that case. A crop or write failure stops the
    /// object at that face, leaving earlier crops in place.
    pub async fn process(&self, source: &SourceObjectRef) -> Result<ExtractionResult> {
        info!(bucket = %source.bucket, key = %source.key, "Extracting faces");

        let image = fetch_source(self.store.as_ref(), source).await?;

        let started = Instant::now();
        let faces = self.detector.detect(&image.base64).await;
        metrics::observe_detection(started.elapsed());
        let faces = faces?;

        debug!(key = %source.key, faces = faces.len(), "Faces detected");

        let mut result = ExtractionResult {
            source: source.clone(),
            derived: Vec::with_capacity(faces.len()),
        };
        if faces.is_empty() {
            return Ok(result);
        }

        let decoded = Arc::new(self.cropper.clone().decode_async(image.data).await?);

        for (index, bbox) in faces.into_iter().enumerate() {
            let target = derived_ref(source, index)?;
            let face = self.cropper.clone().crop_async(decoded.clone(), bbox).await?;
            publish_crop(self.store.as_ref(), &target, &face).await?;
            metrics::record_face_stored();

            debug!(
                derived_key = %target.key,
                width = face.width,
                height = face.height,
                "Face crop stored"
            );
            result.derived.push(target);
        }

        info!(
            bucket = %source.bucket,
            key = %source.key,
            faces = result.derived.len(),
            "Faces extracted"
        );
        Ok(result)
    }
}
