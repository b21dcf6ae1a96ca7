//! Face Extraction Service
//!
//! Event-triggered worker that detects faces in newly uploaded images, stores
//! one JPEG crop per face next to the source, and announces the crops on a
//! message queue.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{ExtractionError, Result};
