/// Data models for face extraction
///
/// Trigger payload types mirror the JSON delivered by the event source;
/// the remaining types flow through the extraction pipeline.
use serde::{Deserialize, Serialize};
use tracing::error;

/// Identifies an uploaded image eligible for processing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceObjectRef {
    pub bucket: String,
    pub key: String,
}

impl SourceObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Axis-aligned face rectangle in source-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBoundingBox {
    /// Exclusive right edge, widened to avoid overflow on hostile input
    pub fn right(&self) -> u64 {
        self.left as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.top as u64 + self.height as u64
    }
}

/// A face crop derived from a source object; lives in the source bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedObjectRef {
    pub bucket: String,
    pub key: String,
}

/// Derived objects written for one source object, in detector order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub source: SourceObjectRef,
    pub derived: Vec<DerivedObjectRef>,
}

impl ExtractionResult {
    pub fn derived_keys(&self) -> Vec<String> {
        self.derived.iter().map(|d| d.key.clone()).collect()
    }
}

// ============================================================================
// Trigger payload
// ============================================================================

/// Object-storage trigger payload
///
/// Messages stay raw so a malformed one cannot reject the whole batch.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerEvent {
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerMessage {
    pub details: ObjectDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDetails {
    pub bucket_id: String,
    pub object_id: String,
}

/// Ordered notifications from one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    pub records: Vec<SourceObjectRef>,
    /// Messages dropped because they lacked a bucket or object id
    pub rejected: usize,
}

impl NotificationBatch {
    pub fn new(records: Vec<SourceObjectRef>) -> Self {
        Self {
            records,
            rejected: 0,
        }
    }

    /// Parse a raw trigger payload
    ///
    /// Fails only when the envelope itself is unreadable. Each message is
    /// parsed on its own; bad ones are logged and counted in `rejected`.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let event: TriggerEvent = serde_json::from_slice(payload)?;
        Ok(event.into())
    }
}

impl From<TriggerEvent> for NotificationBatch {
    fn from(event: TriggerEvent) -> Self {
        let mut batch = NotificationBatch::default();
        for (index, raw) in event.messages.into_iter().enumerate() {
            match serde_json::from_value::<TriggerMessage>(raw) {
                Ok(m) => batch
                    .records
                    .push(SourceObjectRef::new(m.details.bucket_id, m.details.object_id)),
                Err(e) => {
                    error!(index, error = %e, "Dropping malformed trigger message");
                    batch.rejected += 1;
                }
            }
        }
        batch
    }
}

// ============================================================================
// Batch outcome
// ============================================================================

/// What happened to one notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MessageStatus {
    /// Extraction finished; keys may be empty when no faces were found
    Processed { derived_keys: Vec<String> },
    /// Key did not pass the eligibility filter
    Skipped,
    /// Processing failed; later messages were still processed
    Failed { kind: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOutcome {
    pub source: SourceObjectRef,
    #[serde(flatten)]
    pub status: MessageStatus,
}

/// Per-message record of one batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub messages: Vec<MessageOutcome>,
}

impl BatchOutcome {
    pub fn processed(&self) -> usize {
        self.count(|s| matches!(s, MessageStatus::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, MessageStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, MessageStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&MessageStatus) -> bool) -> usize {
        self.messages.iter().filter(|m| pred(&m.status)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_payload() {
        let payload = br#"{
            "messages": [
                {
                    "event_metadata": {"event_type": "yandex.cloud.events.storage.ObjectCreate"},
                    "details": {"bucket_id": "photos", "object_id": "team/retro.jpg"}
                },
                {"details": {"bucket_id": "photos", "object_id": "notes.txt"}}
            ]
        }"#;

        let batch = NotificationBatch::from_slice(payload).unwrap();
        assert_eq!(
            batch.records,
            vec![
                SourceObjectRef::new("photos", "team/retro.jpg"),
                SourceObjectRef::new("photos", "notes.txt"),
            ]
        );
    }

    #[test]
    fn test_malformed_message_does_not_reject_batch() {
        let payload = br#"{"messages": [
            {"details": {"bucket_id": "photos"}},
            {"details": {"bucket_id": "photos", "object_id": "ok.png"}},
            "garbage",
            {"event_metadata": {}}
        ]}"#;

        let batch = NotificationBatch::from_slice(payload).unwrap();
        assert_eq!(batch.records, vec![SourceObjectRef::new("photos", "ok.png")]);
        assert_eq!(batch.rejected, 3);
    }

    #[test]
    fn test_unreadable_envelope_is_error() {
        assert!(NotificationBatch::from_slice(b"{not json").is_err());
        assert!(NotificationBatch::from_slice(br#"{"messages": 5}"#).is_err());
    }

    #[test]
    fn test_empty_payload_is_empty_batch() {
        let batch = NotificationBatch::from_slice(b"{}").unwrap();
        assert!(batch.records.is_empty());
    }

    #[test]
    fn test_bounding_box_edges() {
        let bbox = FaceBoundingBox {
            left: u32::MAX,
            top: 5,
            width: 10,
            height: 20,
        };
        assert_eq!(bbox.right(), u32::MAX as u64 + 10);
        assert_eq!(bbox.bottom(), 25);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = MessageOutcome {
            source: SourceObjectRef::new("b", "a.jpg"),
            status: MessageStatus::Failed {
                kind: "detection_error".to_string(),
                error: "status 500".to_string(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "detection_error");
        assert_eq!(json["source"]["key"], "a.jpg");
    }
}
