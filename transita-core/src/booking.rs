use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Valid transitions: PENDING → CONFIRMED, PENDING → CANCELLED.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission is missing a requester id")]
    MissingRequester,

    #[error("submission is missing a bus route id")]
    MissingRoute,

    #[error("submission has no seats requested")]
    NoSeats,
}

/// A booking request as it travels through the submission queue.
///
/// The dedup key is derived from the submission content, so resubmitting the
/// same request within the queue's dedup window collapses to one delivery.
/// The ordering group keys per-route serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSubmission {
    pub id: Uuid,
    pub requester_id: String,
    pub bus_route_id: String,
    pub seats: Vec<String>,
    pub travel_date: String,
    pub ordering_group: String,
    pub dedup_key: String,
}

impl BookingSubmission {
    pub fn new(
        requester_id: String,
        bus_route_id: String,
        seats: Vec<String>,
        travel_date: String,
    ) -> Self {
        let ordering_group = bus_route_id.clone();
        let dedup_key =
            Self::derive_dedup_key(&requester_id, &bus_route_id, &travel_date, &seats);

        Self {
            id: Uuid::new_v4(),
            requester_id,
            bus_route_id,
            seats,
            travel_date,
            ordering_group,
            dedup_key,
        }
    }

    /// Deterministic content key: identical requests produce identical keys.
    pub fn derive_dedup_key(
        requester_id: &str,
        bus_route_id: &str,
        travel_date: &str,
        seats: &[String],
    ) -> String {
        format!(
            "{}:{}:{}:{}",
            requester_id,
            bus_route_id,
            travel_date,
            seats.join("+")
        )
    }

    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.requester_id.trim().is_empty() {
            return Err(SubmissionError::MissingRequester);
        }
        if self.bus_route_id.trim().is_empty() {
            return Err(SubmissionError::MissingRoute);
        }
        if self.seats.is_empty() {
            return Err(SubmissionError::NoSeats);
        }
        Ok(())
    }
}

/// Durable booking record, keyed by `(id, bus_route_id)`.
///
/// Created exactly once by the booking worker. Only the status transition
/// service changes `status`; the event handlers may stamp delivery metadata
/// but never touch the status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub bus_route_id: String,
    pub requester_id: String,
    pub seats: Vec<String>,
    pub travel_date: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date_confirmed: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn from_submission(submission: &BookingSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: submission.id,
            bus_route_id: submission.bus_route_id.clone(),
            requester_id: submission.requester_id.clone(),
            seats: submission.seats.clone(),
            travel_date: submission.travel_date.clone(),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
            date_confirmed: None,
            last_notified_at: None,
        }
    }
}

/// Cancellation ledger record, keyed by `booking_id`. Written once per
/// cancellation, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledBooking {
    pub booking_id: Uuid,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
    pub cancelled_by: String,
}
