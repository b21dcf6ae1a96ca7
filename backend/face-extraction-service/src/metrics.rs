use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, TextEncoder};
use tracing::error;

static MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "face_extraction_messages_total",
            "Notifications handled by face-extraction-service, by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create face_extraction_messages_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register face_extraction_messages_total");
    counter
});

static FACES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "face_extraction_faces_total",
        "Face crops written to object storage",
    )
    .expect("failed to create face_extraction_faces_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register face_extraction_faces_total");
    counter
});

static DETECTION_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "face_extraction_detection_duration_seconds",
            "Latency of face detection calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .expect("failed to create face_extraction_detection_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register face_extraction_detection_duration_seconds");
    histogram
});

/// `outcome` is `processed`, `skipped`, or an error kind
pub fn record_message(outcome: &str) {
    MESSAGES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Trigger messages dropped before processing because they were malformed
pub fn record_rejected(count: usize) {
    MESSAGES_TOTAL
        .with_label_values(&["invalid_record"])
        .inc_by(count as u64);
}

pub fn record_face_stored() {
    FACES_TOTAL.inc();
}

pub fn observe_detection(elapsed: Duration) {
    DETECTION_DURATION_SECONDS.observe(elapsed.as_secs_f64());
}

/// Render the default registry in the Prometheus text format
pub fn render() -> prometheus::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(buffer)
}

/// `GET /metrics`
pub async fn serve_metrics() -> HttpResponse {
    match render() {
        Ok(body) => HttpResponse::Ok()
            .content_type(prometheus::TEXT_FORMAT)
            .body(body),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
