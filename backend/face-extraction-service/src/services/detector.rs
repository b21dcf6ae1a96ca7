//! Face detection adapter
//!
//! Wraps the Face++ `detect` endpoint behind the [`FaceDetector`] trait so the
//! pipeline can be exercised against in-memory fakes.

use crate::config::DetectionConfig;
use crate::error::{ExtractionError, Result};
use crate::models::FaceBoundingBox;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

/// Longest slice of an error body kept in error messages
const MAX_ERROR_BODY: usize = 256;

/// Returns face rectangles for a base64-encoded image, in service order.
///
/// An `Ok` with an empty vector means the call succeeded and found no faces;
/// a failed call is always an `Err`.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, image_base64: &str) -> Result<Vec<FaceBoundingBox>>;
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    faces: Vec<DetectedFace>,
}

#[derive(Debug, Deserialize)]
struct DetectedFace {
    face_rectangle: FaceRectangle,
}

#[derive(Debug, Deserialize)]
struct FaceRectangle {
    left: i64,
    top: i64,
    width: i64,
    height: i64,
}

impl FaceRectangle {
    fn into_bounding_box(self) -> Result<FaceBoundingBox> {
        let coord = |name: &str, value: i64, min: i64| -> Result<u32> {
            if value < min {
                return Err(ExtractionError::Detection(format!(
                    "face_rectangle.{} out of range: {}",
                    name, value
                )));
            }
            u32::try_from(value).map_err(|_| {
                ExtractionError::Detection(format!(
                    "face_rectangle.{} out of range: {}",
                    name, value
                ))
            })
        };

        Ok(FaceBoundingBox {
            left: coord("left", self.left, 0)?,
            top: coord("top", self.top, 0)?,
            width: coord("width", self.width, 1)?,
            height: coord("height", self.height, 1)?,
        })
    }
}

/// HTTP client for the Face++ detect API
pub struct FacePlusPlusDetector {
    http_client: Client,
    url: String,
    api_key: String,
    api_secret: String,
}

impl FacePlusPlusDetector {
    /// Create a detector whose requests expire after the configured timeout
    pub fn from_config(cfg: &DetectionConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| ExtractionError::Detection(format!("Failed to create HTTP client: {e}")))?;

        info!(url = %cfg.url, timeout_secs = cfg.timeout_secs, "Face detector initialized");

        Ok(Self {
            http_client,
            url: cfg.url.clone(),
            api_key: cfg.api_key.clone(),
            api_secret: cfg.api_secret.clone(),
        })
    }
}

#[async_trait]
impl FaceDetector for FacePlusPlusDetector {
    async fn detect(&self, image_base64: &str) -> Result<Vec<FaceBoundingBox>> {
        let form = [
            ("api_key", self.api_key.as_str()),
            ("api_secret", self.api_secret.as_str()),
            ("image_base64", image_base64),
        ];

        let response = self
            .http_client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Detection(format!("Detection request timed out: {e}"))
                } else {
                    ExtractionError::Detection(format!("Detection request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ExtractionError::Detection(format!(
                "Detection service returned {}: {}",
                status, body
            )));
        }

        let parsed: DetectResponse = response.json().await.map_err(|e| {
            ExtractionError::Detection(format!("Invalid detection response: {e}"))
        })?;

        let faces = parsed
            .faces
            .into_iter()
            .map(|f| f.face_rectangle.into_bounding_box())
            .collect::<Result<Vec<_>>>()?;

        debug!(faces = faces.len(), "Detection completed");
        Ok(faces)
    }
}
