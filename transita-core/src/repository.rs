use crate::booking::{Booking, BookingStatus, CancelledBooking};
use crate::identity::UserAccount;
use crate::route::BusRoute;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Retryable, bounded by the queue's redelivery budget.
    #[error("transient storage failure: {0}")]
    Transient(String),
}

/// Outcome of a conditional create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    AlreadyExists,
}

/// Outcome of a compare-and-set status update.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Updated(Booking),
    /// The record's current status did not match the expected one; a
    /// concurrent transition got there first.
    PreconditionFailed(BookingStatus),
    Missing,
}

/// Keyed storage for booking records. Key = `(id, bus_route_id)`.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get(&self, id: Uuid, bus_route_id: &str) -> Result<Option<Booking>, StoreError>;

    /// Create-if-absent; the booking worker's idempotency hinges on this.
    async fn put_if_absent(&self, booking: Booking) -> Result<PutOutcome, StoreError>;

    /// Compare-and-set on status. Metadata untouched.
    async fn update_status_if(
        &self,
        id: Uuid,
        bus_route_id: &str,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Stamp the confirmation time, first delivery only. Never changes status.
    async fn stamp_confirmed(
        &self,
        id: Uuid,
        bus_route_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Record the latest notification dispatch. Never changes status.
    async fn record_notified(
        &self,
        id: Uuid,
        bus_route_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Append-only cancellation ledger keyed by `booking_id`.
#[async_trait]
pub trait CancelledBookingLedger: Send + Sync {
    async fn get(&self, booking_id: Uuid) -> Result<Option<CancelledBooking>, StoreError>;

    /// Create-if-absent; a second write for the same booking is a no-op.
    async fn put_if_absent(&self, entry: CancelledBooking) -> Result<PutOutcome, StoreError>;
}

/// Read-only lookup owned by the external user service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, StoreError>;
}

/// Read-only lookup owned by the external route catalog.
#[async_trait]
pub trait RouteDirectory: Send + Sync {
    async fn get_route(&self, id: &str) -> Result<Option<BusRoute>, StoreError>;
}
