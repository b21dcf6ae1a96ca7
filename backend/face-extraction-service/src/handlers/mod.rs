/// HTTP handlers for the trigger endpoint
///
/// The event source always receives the same acknowledgement; the per-message
/// outcome is only visible in logs and metrics.
use crate::config::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::models::NotificationBatch;
use crate::services::BatchProcessor;
use actix_web::{web, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use serde_json::json;
use tracing::error;

/// Largest trigger body read before the invocation is dropped
#[derive(Debug, Clone, Copy)]
pub struct TriggerLimit(pub usize);

impl Default for TriggerLimit {
    fn default() -> Self {
        Self(DEFAULT_MAX_PAYLOAD_BYTES as usize)
    }
}

/// Fixed acknowledgement returned for every invocation
pub fn ack() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "statusCode": 200,
        "body": "OK",
    }))
}

/// Accept an object-storage trigger batch and process it to completion
///
/// Oversized or broken uploads are dropped but still acknowledged.
pub async fn handle_trigger(
    processor: web::Data<BatchProcessor>,
    limit: Option<web::Data<TriggerLimit>>,
    mut payload: web::Payload,
) -> HttpResponse {
    let limit = limit.map(|l| *l.get_ref()).unwrap_or_default().0;

    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                error!(error = %e, "Failed to read trigger payload");
                return ack();
            }
        };
        if body.len() + chunk.len() > limit {
            error!(limit, "Trigger payload exceeds limit, dropping invocation");
            return ack();
        }
        body.extend_from_slice(&chunk);
    }

    let batch = match NotificationBatch::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            error!(error = %e, size = body.len(), "Failed to parse trigger payload");
            return ack();
        }
    };

    processor.process_batch(batch).await;
    ack()
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// Register trigger, health and metrics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::post().to(handle_trigger))
        .route("/api/v1/trigger", web::post().to(handle_trigger))
        .route("/api/v1/health", web::get().to(health))
        .route(
            "/api/v1/health/live",
            web::get().to(|| async { HttpResponse::Ok().finish() }),
        )
        .route(
            "/api/v1/health/ready",
            web::get().to(|| async { HttpResponse::Ok().finish() }),
        )
        .route("/metrics", web::get().to(crate::metrics::serve_metrics));
}
