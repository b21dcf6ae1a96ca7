/// Object storage for source images and face crops
///
/// Provides the [`ObjectStore`] capability plus an S3 implementation that also
/// works against S3-compatible storage (MinIO, Yandex Object Storage).
use crate::config::StorageConfig;
use crate::error::{ExtractionError, Result};
use crate::models::{DerivedObjectRef, SourceObjectRef};
use crate::services::cropper::CroppedFace;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use base64::Engine;
use bytes::Bytes;

/// Content type of every stored crop
pub const CROP_CONTENT_TYPE: &str = "image/jpeg";

/// Narrow object-store capability used by the pipeline
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()>;
}

/// Source image as fetched, with the encoding the detector expects
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub data: Bytes,
    pub base64: String,
}

/// Download a source image and base64-encode it
pub async fn fetch_source(store: &dyn ObjectStore, source: &SourceObjectRef) -> Result<SourceImage> {
    let data = store.get(&source.bucket, &source.key).await?;
    let base64 = base64::engine::general_purpose::STANDARD.encode(&data);
    Ok(SourceImage { data, base64 })
}

/// Store a face crop under its derived key
pub async fn publish_crop(
    store: &dyn ObjectStore,
    target: &DerivedObjectRef,
    face: &CroppedFace,
) -> Result<()> {
    store
        .put(&target.bucket, &target.key, face.data.clone(), CROP_CONTENT_TYPE)
        .await
}

/// S3-backed object store
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &StorageConfig) -> Self {
        Self::new(get_s3_client(config).await)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("NoSuchKey") || error_msg.contains("404") {
                    ExtractionError::Fetch(format!("Object not found: {}/{}", bucket, key))
                } else {
                    ExtractionError::Fetch(format!("Failed to download {}/{}: {}", bucket, key, e))
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ExtractionError::Fetch(format!("Failed to read object body: {e}")))?
            .into_bytes();

        Ok(bytes)
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("403") || error_msg.contains("Forbidden") {
                    ExtractionError::StoreWrite(
                        "S3 auth failed (403): Check AWS credentials".to_string(),
                    )
                } else if error_msg.contains("NoSuchBucket") {
                    ExtractionError::StoreWrite(format!("S3 bucket not found: {}", bucket))
                } else {
                    ExtractionError::StoreWrite(format!("S3 upload failed: {}", e))
                }
            })?;

        Ok(())
    }
}

/// Build an S3 client from configuration
///
/// Explicit credentials are used only when both halves are set; otherwise the
/// default credential chain applies. A custom endpoint switches to path-style
/// addressing, which S3-compatible stores expect.
pub async fn get_s3_client(config: &StorageConfig) -> Client {
    let sdk_config = load_sdk_config(
        &config.region,
        config.access_key_id.as_deref(),
        config.secret_access_key.as_deref(),
        config.endpoint.as_deref(),
        "face_extraction_s3",
    )
    .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.endpoint.is_some())
        .build();

    Client::from_conf(s3_config)
}

/// Shared AWS SDK configuration for the S3 and SQS clients
pub(crate) async fn load_sdk_config(
    region: &str,
    access_key_id: Option<&str>,
    secret_access_key: Option<&str>,
    endpoint: Option<&str>,
    provider_name: &'static str,
) -> aws_config::SdkConfig {
    use aws_sdk_s3::config::Region;

    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()));

    if let (Some(access_key_id), Some(secret_access_key)) = (access_key_id, secret_access_key) {
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            provider_name,
        );
        builder = builder.credentials_provider(credentials);
    }

    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    builder.load().await
}
