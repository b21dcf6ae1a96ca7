/// Face Extraction Service - HTTP trigger endpoint
///
/// Receives object-storage trigger batches and extracts face crops.
///
/// Environment variables:
/// - FACEPP_API_KEY / FACEPP_API_SECRET: detection service credentials
/// - FACEPP_DETECT_URL: detection endpoint (default: Face++ US)
/// - DETECTION_TIMEOUT_SECS: detection request timeout (default: 30)
/// - QUEUE_URL: notification queue URL
/// - SQS_ENDPOINT: SQS-compatible endpoint (optional)
/// - S3_ENDPOINT: S3-compatible endpoint (optional)
/// - AWS_REGION / AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY: storage and queue access
/// - QUEUE_MESSAGE_FORMAT: `list` (default) or `json`
/// - CROP_JPEG_QUALITY: JPEG quality 1-100 (default: 90)
/// - CROP_STRICT_BOUNDS: reject out-of-image rectangles (default: true)
/// - BATCH_CONCURRENCY: messages processed at once (default: 1)
/// - FACE_SERVICE_HOST / FACE_SERVICE_PORT (or PORT): bind address
/// - TRIGGER_MAX_PAYLOAD_BYTES: largest accepted trigger body (default: 16 MiB)
/// - LOG_FORMAT: `json` for structured output
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::Context;
use face_extraction_service::handlers;
use face_extraction_service::services::{
    BatchProcessor, ExtractionOrchestrator, FaceCropper, FacePlusPlusDetector,
    NotificationSender, S3ObjectStore, SqsQueue,
};
use face_extraction_service::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("face_extraction_service=info,actix_web=info"));
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    let store = Arc::new(S3ObjectStore::from_config(&config.storage).await);
    let detector = Arc::new(
        FacePlusPlusDetector::from_config(&config.detection)
            .context("Failed to initialize face detector")?,
    );
    let cropper = Arc::new(FaceCropper::new(config.cropper.clone()));
    let queue = Arc::new(SqsQueue::from_config(&config.queue, &config.storage).await);

    let orchestrator = ExtractionOrchestrator::new(store, detector, cropper);
    let notifier = NotificationSender::new(queue, config.queue.message_format);
    let processor = web::Data::new(
        BatchProcessor::new(orchestrator, notifier).with_concurrency(config.batch.concurrency),
    );

    let trigger_limit = web::Data::new(handlers::TriggerLimit(config.app.max_payload_bytes));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    info!(
        address = %bind_address,
        strict_bounds = config.cropper.strict_bounds,
        concurrency = config.batch.concurrency,
        "Face Extraction Service starting"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(processor.clone())
            .app_data(trigger_limit.clone())
            .wrap(actix_middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server failed")?;

    info!("Face Extraction Service shutting down");
    Ok(())
}
