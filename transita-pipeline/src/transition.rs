use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use transita_core::booking::{Booking, BookingStatus};
use transita_core::events::{DomainEvent, EventPublisher, EventSource};
use transita_core::repository::{BookingRepository, StoreError, UpdateOutcome};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("booking {id} not found for route {route}")]
    NotFound { id: Uuid, route: String },

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Caller-supplied context for a transition, carried into the event detail.
/// Only cancellations use it today.
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    pub reason: Option<String>,
    pub cancelled_by: Option<String>,
}

/// Validates and applies status changes, then announces them on the event
/// bus. The status write always precedes the publication: no event exists
/// without a durable state change behind it.
pub struct StatusTransitionService {
    store: Arc<dyn BookingRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl StatusTransitionService {
    pub fn new(store: Arc<dyn BookingRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    pub async fn transition(
        &self,
        booking_id: Uuid,
        bus_route_id: &str,
        target: BookingStatus,
        ctx: TransitionContext,
    ) -> Result<Booking, TransitionError> {
        let booking = self
            .store
            .get(booking_id, bus_route_id)
            .await?
            .ok_or_else(|| TransitionError::NotFound {
                id: booking_id,
                route: bus_route_id.to_string(),
            })?;

        let Some(source) = EventSource::for_status(target) else {
            return Err(TransitionError::InvalidTransition {
                from: booking.status,
                to: target,
            });
        };
        if !booking.status.can_transition_to(target) {
            return Err(TransitionError::InvalidTransition {
                from: booking.status,
                to: target,
            });
        }

        let updated = match self
            .store
            .update_status_if(booking_id, bus_route_id, booking.status, target)
            .await?
        {
            UpdateOutcome::Updated(booking) => booking,
            UpdateOutcome::PreconditionFailed(current) => {
                // A concurrent transition won the race.
                return Err(TransitionError::InvalidTransition {
                    from: current,
                    to: target,
                });
            }
            UpdateOutcome::Missing => {
                return Err(TransitionError::NotFound {
                    id: booking_id,
                    route: bus_route_id.to_string(),
                });
            }
        };

        info!(
            booking = %booking_id,
            route = %bus_route_id,
            status = %target,
            "booking status transition applied"
        );

        let detail = match target {
            BookingStatus::Cancelled => json!({
                "reason": ctx.reason,
                "cancelled_by": ctx.cancelled_by,
            }),
            _ => serde_json::Value::Null,
        };
        let event = DomainEvent::new(source, booking_id, bus_route_id.to_string(), detail);

        // The status change is already durable. A failed publication is not
        // grounds to roll it back or to fail the caller; it is reconciled out
        // of band.
        if let Err(err) = self.publisher.publish(event).await {
            error!(
                booking = %booking_id,
                status = %target,
                %err,
                "status persisted but event publication failed, manual reconciliation required"
            );
        }

        Ok(updated)
    }
}
