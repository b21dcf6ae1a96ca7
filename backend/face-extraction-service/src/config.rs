/// Configuration management for face-extraction-service
///
/// Loads configuration from environment variables with sensible defaults.
/// The resulting struct is built once in `main` and handed to the components;
/// nothing below the binary reads the environment.
use serde::Deserialize;
use std::time::Duration;

/// Default limit for one trigger body
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Default Face++ detect endpoint
pub const DEFAULT_DETECT_URL: &str = "https://api-us.faceplusplus.com/facepp/v3/detect";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub detection: DetectionConfig,
    pub queue: QueueConfig,
    pub cropper: CropperConfig,
    pub batch: BatchConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Larger trigger bodies are acknowledged and dropped
    pub max_payload_bytes: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// S3-compatible endpoint, e.g. `https://storage.yandexcloud.net`
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DetectionConfig {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout_secs: u64,
}

impl DetectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// `['a_face_0.jpg', 'a_face_1.jpg']`
    #[default]
    List,
    /// `["a_face_0.jpg","a_face_1.jpg"]`
    Json,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueueConfig {
    pub url: String,
    pub endpoint: Option<String>,
    pub message_format: MessageFormat,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CropperConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Reject rectangles that leave the image instead of clamping them
    pub strict_bounds: bool,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            strict_bounds: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchConfig {
    /// Messages processed at once within one batch
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, String> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{} not set", name))
        };
        let parsed = |name: &str, default: u64| -> Result<u64, String> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| format!("{} is not a valid number: {}", name, e)),
                None => Ok(default),
            }
        };

        let port: u16 = lookup("FACE_SERVICE_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| format!("FACE_SERVICE_PORT is not a valid port: {}", e))?;

        let message_format = match lookup("QUEUE_MESSAGE_FORMAT").as_deref() {
            None | Some("list") => MessageFormat::List,
            Some("json") => MessageFormat::Json,
            Some(other) => return Err(format!("Unknown QUEUE_MESSAGE_FORMAT: {}", other)),
        };

        let jpeg_quality = parsed("CROP_JPEG_QUALITY", 90)?;
        if !(1..=100).contains(&jpeg_quality) {
            return Err(format!(
                "CROP_JPEG_QUALITY must be between 1 and 100, got {}",
                jpeg_quality
            ));
        }

        let strict_bounds: bool = match lookup("CROP_STRICT_BOUNDS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| format!("CROP_STRICT_BOUNDS is not a boolean: {}", e))?,
            None => true,
        };

        Ok(Config {
            app: AppConfig {
                host: lookup("FACE_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                max_payload_bytes: parsed("TRIGGER_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?
                    as usize,
            },
            storage: StorageConfig {
                region: lookup("AWS_REGION").unwrap_or_else(|| "ru-central1".to_string()),
                access_key_id: lookup("AWS_ACCESS_KEY_ID"),
                secret_access_key: lookup("AWS_SECRET_ACCESS_KEY"),
                endpoint: lookup("S3_ENDPOINT"),
            },
            detection: DetectionConfig {
                url: lookup("FACEPP_DETECT_URL").unwrap_or_else(|| DEFAULT_DETECT_URL.to_string()),
                api_key: required("FACEPP_API_KEY")?,
                api_secret: required("FACEPP_API_SECRET")?,
                timeout_secs: parsed("DETECTION_TIMEOUT_SECS", 30)?,
            },
            queue: QueueConfig {
                url: required("QUEUE_URL")?,
                endpoint: lookup("SQS_ENDPOINT"),
                message_format,
            },
            cropper: CropperConfig {
                jpeg_quality: jpeg_quality as u8,
                strict_bounds,
            },
            batch: BatchConfig {
                concurrency: (parsed("BATCH_CONCURRENCY", 1)? as usize).max(1),
            },
        })
    }
}
