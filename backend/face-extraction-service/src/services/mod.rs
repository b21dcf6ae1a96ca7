//! Face extraction pipeline
//!
//! - Object storage access for sources and crops
//! - Face detection adapter
//! - Cropper for cutting and encoding faces
//! - Orchestrator for the per-object workflow
//! - Batch processor and queue notifier for trigger batches

pub mod batch;
pub mod cropper;
pub mod detector;
pub mod naming;
pub mod notifier;
pub mod orchestrator;
pub mod storage;

pub use batch::BatchProcessor;
pub use cropper::{CroppedFace, FaceCropper};
pub use detector::{FaceDetector, FacePlusPlusDetector};
pub use naming::{derived_key, derived_ref, is_eligible};
pub use notifier::{NotificationQueue, NotificationSender, SqsQueue};
pub use orchestrator::ExtractionOrchestrator;
pub use storage::{ObjectStore, S3ObjectStore};
