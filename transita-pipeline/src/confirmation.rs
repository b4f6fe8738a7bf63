use crate::email;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use transita_core::events::DomainEvent;
use transita_core::notify::Notifier;
use transita_core::repository::{BookingRepository, RouteDirectory, UserDirectory};
use transita_events::{EventHandler, HandlerError};

/// Consumes `booking:confirmed` events: stamps the confirmation time and
/// notifies the requester. Safe to invoke any number of times for the same
/// event; only the notification may repeat.
pub struct ConfirmationHandler {
    store: Arc<dyn BookingRepository>,
    users: Arc<dyn UserDirectory>,
    routes: Arc<dyn RouteDirectory>,
    notifier: Arc<dyn Notifier>,
    customer_support: String,
}

impl ConfirmationHandler {
    pub fn new(
        store: Arc<dyn BookingRepository>,
        users: Arc<dyn UserDirectory>,
        routes: Arc<dyn RouteDirectory>,
        notifier: Arc<dyn Notifier>,
        customer_support: String,
    ) -> Self {
        Self {
            store,
            users,
            routes,
            notifier,
            customer_support,
        }
    }
}

#[async_trait]
impl EventHandler for ConfirmationHandler {
    fn name(&self) -> &str {
        "confirmation"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let booking = self
            .store
            .get(event.booking_id, &event.bus_route_id)
            .await?
            .ok_or_else(|| HandlerError::NotFound(event.booking_id.to_string()))?;

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

        // Delivery metadata only; the status was written before the event
        // was published.
        self.store
            .stamp_confirmed(booking.id, &booking.bus_route_id, event.occurred_at)
            .await?;

        let notification =
            email::confirmed_booking(&user, &route, &booking, &self.customer_support);
        self.notifier.send(notification).await?;
        self.store
            .record_notified(booking.id, &booking.bus_route_id, Utc::now())
            .await?;

        debug!(booking = %booking.id, attempt = event.attempt, "confirmation handled");
        Ok(())
    }
}
