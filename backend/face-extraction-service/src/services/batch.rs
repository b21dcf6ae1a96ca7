//! Batch processor - runs the extraction pipeline over one trigger batch
//!
//! Each message is isolated: its failure is logged and recorded in the
//! outcome, and the remaining messages are still processed.

use super::naming::is_eligible;
use super::notifier::NotificationSender;
use super::orchestrator::ExtractionOrchestrator;
use crate::error::Result;
use crate::metrics;
use crate::models::{BatchOutcome, MessageOutcome, MessageStatus, NotificationBatch, SourceObjectRef};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

pub struct BatchProcessor {
    orchestrator: ExtractionOrchestrator,
    notifier: NotificationSender,
    concurrency: usize,
}

impl BatchProcessor {
    pub fn new(orchestrator: ExtractionOrchestrator, notifier: NotificationSender) -> Self {
        Self {
            orchestrator,
            notifier,
            concurrency: 1,
        }
    }

    /// Process up to `concurrency` messages at once; outcomes keep input order
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Process every record of the batch to completion
    pub async fn process_batch(&self, batch: NotificationBatch) -> BatchOutcome {
        let NotificationBatch { records, rejected } = batch;
        if rejected > 0 {
            metrics::record_rejected(rejected);
        }

        let messages: Vec<MessageOutcome> = stream::iter(records)
            .map(|source| self.process_record(source))
            .buffered(self.concurrency)
            .collect()
            .await;

        let outcome = BatchOutcome { messages };
        info!(
            total = outcome.messages.len(),
            processed = outcome.processed(),
            skipped = outcome.skipped(),
            failed = outcome.failed(),
            rejected,
            "Batch processed"
        );
        outcome
    }

    async fn process_record(&self, source: SourceObjectRef) -> MessageOutcome {
        if !is_eligible(&source.key) {
            debug!(bucket = %source.bucket, key = %source.key, "Ignoring ineligible object");
            metrics::record_message("skipped");
            return MessageOutcome {
                source,
                status: MessageStatus::Skipped,
            };
        }

        let status = match self.extract_and_notify(&source).await {
            Ok(derived_keys) => {
                metrics::record_message("processed");
                MessageStatus::Processed { derived_keys }
            }
            Err(e) => {
                error!(
                    bucket = %source.bucket,
                    key = %source.key,
                    kind = e.kind(),
                    error = %e,
                    "Failed to extract faces"
                );
                metrics::record_message(e.kind());
                MessageStatus::Failed {
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                }
            }
        };

        MessageOutcome { source, status }
    }

    async fn extract_and_notify(&self, source: &SourceObjectRef) -> Result<Vec<String>> {
        let result = self.orchestrator.process(source).await?;
        let derived_keys = result.derived_keys();
        self.notifier.notify(source, &derived_keys).await?;
        Ok(derived_keys)
    }
}
