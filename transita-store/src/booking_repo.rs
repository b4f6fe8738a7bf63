use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use transita_core::booking::{Booking, BookingStatus};
use transita_core::repository::{BookingRepository, PutOutcome, StoreError, UpdateOutcome};
use uuid::Uuid;

/// In-memory booking store keyed by `(id, bus_route_id)`.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<(Uuid, String), Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingStore {
    async fn get(&self, id: Uuid, bus_route_id: &str) -> Result<Option<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&(id, bus_route_id.to_string())).cloned())
    }

    async fn put_if_absent(&self, booking: Booking) -> Result<PutOutcome, StoreError> {
        let mut bookings = self.bookings.write().await;
        let key = (booking.id, booking.bus_route_id.clone());
        if bookings.contains_key(&key) {
            return Ok(PutOutcome::AlreadyExists);
        }
        bookings.insert(key, booking);
        Ok(PutOutcome::Created)
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        bus_route_id: &str,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&(id, bus_route_id.to_string())) {
            None => Ok(UpdateOutcome::Missing),
            Some(booking) if booking.status != expected => {
                Ok(UpdateOutcome::PreconditionFailed(booking.status))
            }
            Some(booking) => {
                booking.status = target;
                booking.updated_at = Utc::now();
                Ok(UpdateOutcome::Updated(booking.clone()))
            }
        }
    }

    async fn stamp_confirmed(
        &self,
        id: Uuid,
        bus_route_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&(id, bus_route_id.to_string())) {
            Some(booking) => {
                // First delivery wins; redeliveries leave the stamp alone.
                if booking.date_confirmed.is_none() {
                    booking.date_confirmed = Some(at);
                    booking.updated_at = Utc::now();
                }
                Ok(())
            }
            None => {
                tracing::warn!(booking = %id, "confirmation stamp for unknown booking ignored");
                Ok(())
            }
        }
    }

    async fn record_notified(
        &self,
        id: Uuid,
        bus_route_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&(id, bus_route_id.to_string())) {
            Some(booking) => {
                booking.last_notified_at = Some(at);
                booking.updated_at = Utc::now();
                Ok(())
            }
            None => {
                tracing::warn!(booking = %id, "notification stamp for unknown booking ignored");
                Ok(())
            }
        }
    }
}
