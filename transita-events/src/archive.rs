use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use transita_core::events::DomainEvent;

#[derive(Debug, Clone)]
pub struct ArchivedEvent {
    pub event: DomainEvent,
    pub archived_at: DateTime<Utc>,
}

/// Append-only archive of every published event, kept for audit and replay.
/// Archival is independent of handler outcome. Entries older than the
/// retention window are pruned on append.
pub struct EventArchive {
    retention: Duration,
    entries: Mutex<Vec<ArchivedEvent>>,
}

impl EventArchive {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub async fn append(&self, event: DomainEvent) {
        let now = Utc::now();
        let cutoff = now - self.retention;

        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.archived_at > cutoff);
        entries.push(ArchivedEvent {
            event,
            archived_at: now,
        });
    }

    /// Events archived at or after `since`, oldest first.
    pub async fn replay_since(&self, since: DateTime<Utc>) -> Vec<ArchivedEvent> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.archived_at >= since)
            .cloned()
            .collect()
    }

    pub async fn entries(&self) -> Vec<ArchivedEvent> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for EventArchive {
    fn default() -> Self {
        Self::new(Duration::days(30))
    }
}
