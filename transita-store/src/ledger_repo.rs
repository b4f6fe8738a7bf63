use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use transita_core::booking::CancelledBooking;
use transita_core::repository::{CancelledBookingLedger, PutOutcome, StoreError};
use uuid::Uuid;

/// In-memory cancellation ledger keyed by `booking_id`. Entries are written
/// once and never updated.
#[derive(Default)]
pub struct InMemoryCancelledLedger {
    entries: RwLock<HashMap<Uuid, CancelledBooking>>,
}

impl InMemoryCancelledLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CancelledBookingLedger for InMemoryCancelledLedger {
    async fn get(&self, booking_id: Uuid) -> Result<Option<CancelledBooking>, StoreError> {
        Ok(self.entries.read().await.get(&booking_id).cloned())
    }

    async fn put_if_absent(&self, entry: CancelledBooking) -> Result<PutOutcome, StoreError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.booking_id) {
            return Ok(PutOutcome::AlreadyExists);
        }
        entries.insert(entry.booking_id, entry);
        Ok(PutOutcome::Created)
    }
}
