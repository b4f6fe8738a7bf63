use crate::email;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use transita_core::booking::CancelledBooking;
use transita_core::events::DomainEvent;
use transita_core::notify::Notifier;
use transita_core::repository::{
    BookingRepository, CancelledBookingLedger, PutOutcome, RouteDirectory, UserDirectory,
};
use transita_events::{EventHandler, HandlerError};

/// Consumes `booking:cancelled` events: writes the cancellation ledger entry
/// (once, ever) and notifies the requester. The ledger write precedes the
/// notification attempt, so a crash in between leaves a reconcilable state.
pub struct CancellationHandler {
    store: Arc<dyn BookingRepository>,
    ledger: Arc<dyn CancelledBookingLedger>,
    users: Arc<dyn UserDirectory>,
    routes: Arc<dyn RouteDirectory>,
    notifier: Arc<dyn Notifier>,
    customer_support: String,
}

impl CancellationHandler {
    pub fn new(
        store: Arc<dyn BookingRepository>,
        ledger: Arc<dyn CancelledBookingLedger>,
        users: Arc<dyn UserDirectory>,
        routes: Arc<dyn RouteDirectory>,
        notifier: Arc<dyn Notifier>,
        customer_support: String,
    ) -> Self {
        Self {
            store,
            ledger,
            users,
            routes,
            notifier,
            customer_support,
        }
    }
}

#[async_trait]
impl EventHandler for CancellationHandler {
    fn name(&self) -> &str {
        "cancellation"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let booking = self
            .store
            .get(event.booking_id, &event.bus_route_id)
            .await?
            .ok_or_else(|| HandlerError::NotFound(event.booking_id.to_string()))?;

        let reason = event
            .detail
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("unspecified")
            .to_string();
        let cancelled_by = event
            .detail
            .get("cancelled_by")
            .and_then(|v| v.as_str())
            .unwrap_or(booking.requester_id.as_str())
            .to_string();

        let entry = CancelledBooking {
            booking_id: booking.id,
            cancelled_at: event.occurred_at,
            reason,
            cancelled_by: cancelled_by.clone(),
        };
        match self.ledger.put_if_absent(entry).await? {
            PutOutcome::Created => {
                debug!(booking = %booking.id, "cancellation ledger entry written");
            }
            PutOutcome::AlreadyExists => {
                // Redelivery after the ledger write; nothing left to record.
                debug!(booking = %booking.id, "cancellation ledger entry already present");
            }
        }

        let user = self
            .users
            .get_user(&booking.requester_id)
            .await?
            .ok_or_else(|| {
                HandlerError::Lookup(format!("user account {} not found", booking.requester_id))
            })?;
        let route = self
            .routes
            .get_route(&booking.bus_route_id)
            .await?
            .ok_or_else(|| {
                HandlerError::Lookup(format!("bus route {} not found", booking.bus_route_id))
            })?;

        let notification = email::cancelled_booking(
            &user,
            &route,
            &booking,
            &cancelled_by,
            &self.customer_support,
        );
        self.notifier.send(notification).await?;
        self.store
            .record_notified(booking.id, &booking.bus_route_id, Utc::now())
            .await?;

        debug!(booking = %booking.id, attempt = event.attempt, "cancellation handled");
        Ok(())
    }
}
