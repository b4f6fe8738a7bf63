use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use transita_core::booking::BookingSubmission;

/// A submission that exhausted its processing budget, parked for manual
/// inspection. Nothing in the pipeline repairs these automatically.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub submission: BookingSubmission,
    pub receive_count: u32,
    pub reason: String,
    pub dead_at: DateTime<Utc>,
}

impl DeadLetter {
    pub fn new(submission: BookingSubmission, receive_count: u32, reason: String) -> Self {
        Self {
            submission,
            receive_count,
            reason,
            dead_at: Utc::now(),
        }
    }
}

/// Append-only dead-letter sink for the submission queue.
#[derive(Default)]
pub struct DeadLetterSink {
    entries: Mutex<Vec<DeadLetter>>,
}

impl DeadLetterSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, entry: DeadLetter) {
        tracing::warn!(
            submission = %entry.submission.id,
            receive_count = entry.receive_count,
            reason = %entry.reason,
            "submission moved to dead-letter sink"
        );
        self.entries.lock().await.push(entry);
    }

    pub async fn entries(&self) -> Vec<DeadLetter> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
