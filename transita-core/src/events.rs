use crate::booking::BookingStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Event source routed on by the domain event bus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventSource {
    #[serde(rename = "booking:confirmed")]
    BookingConfirmed,
    #[serde(rename = "booking:cancelled")]
    BookingCancelled,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::BookingConfirmed => "booking:confirmed",
            EventSource::BookingCancelled => "booking:cancelled",
        }
    }

    /// The event source announcing a transition into the given status.
    /// PENDING is not announced; nothing has happened yet.
    pub fn for_status(status: BookingStatus) -> Option<Self> {
        match status {
            BookingStatus::Confirmed => Some(EventSource::BookingConfirmed),
            BookingStatus::Cancelled => Some(EventSource::BookingCancelled),
            BookingStatus::Pending => None,
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status transition announcement. Immutable once published; the bus stamps
/// `attempt` per delivery attempt. `detail` carries transition context, e.g.
/// the cancellation reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub source: EventSource,
    pub booking_id: Uuid,
    pub bus_route_id: String,
    pub occurred_at: DateTime<Utc>,
    pub attempt: u32,
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl DomainEvent {
    pub fn new(
        source: EventSource,
        booking_id: Uuid,
        bus_route_id: String,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            source,
            booking_id,
            bus_route_id,
            occurred_at: Utc::now(),
            attempt: 0,
            detail,
        }
    }

    pub fn with_attempt(&self, attempt: u32) -> Self {
        let mut event = self.clone();
        event.attempt = attempt;
        event
    }
}

#[derive(Debug, thiserror::Error)]
#[error("event publication failed: {0}")]
pub struct PublishError(pub String);

/// Seam between the status transition service and the event bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), PublishError>;
}
