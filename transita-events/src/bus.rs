use crate::archive::EventArchive;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};
use transita_core::events::{DomainEvent, EventPublisher, PublishError};
use transita_core::notify::NotifyError;
use transita_core::repository::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("booking not found: {0}")]
    NotFound(String),

    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Notification(#[from] NotifyError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

/// A delivery the bus gave up on: the handler failed its final attempt.
/// There is no dead-letter destination for events; these are reported and
/// left for out-of-band reconciliation.
#[derive(Debug, Clone)]
pub struct FailedDelivery {
    pub handler: String,
    pub event: DomainEvent,
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

struct Subscription {
    pattern: String,
    handler: Arc<dyn EventHandler>,
    retry: RetryPolicy,
}

/// Topic-based router for domain events. Every handler bound to a matching
/// source receives the event independently, with its own retry policy; all
/// published events are archived regardless of handler outcome.
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
    archive: EventArchive,
    failed: Mutex<Vec<FailedDelivery>>,
}

impl EventBus {
    pub fn new(archive: EventArchive) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            archive,
            failed: Mutex::new(Vec::new()),
        }
    }

    /// Bind a handler to an event source. Matching is an exact string match
    /// on the source.
    pub async fn subscribe(
        &self,
        source_pattern: impl Into<String>,
        handler: Arc<dyn EventHandler>,
        retry: RetryPolicy,
    ) {
        let pattern = source_pattern.into();
        debug!(pattern = %pattern, handler = handler.name(), "handler subscribed");
        self.subscriptions.write().await.push(Subscription {
            pattern,
            handler,
            retry,
        });
    }

    pub fn archive(&self) -> &EventArchive {
        &self.archive
    }

    pub async fn failed_deliveries(&self) -> Vec<FailedDelivery> {
        self.failed.lock().await.clone()
    }

    async fn deliver(&self, subscription: &Subscription, event: &DomainEvent) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let delivery = event.with_attempt(attempt);
            match subscription.handler.handle(&delivery).await {
                Ok(()) => {
                    debug!(
                        handler = subscription.handler.name(),
                        booking = %event.booking_id,
                        attempt,
                        "event delivered"
                    );
                    return;
                }
                Err(err) if attempt < subscription.retry.max_attempts => {
                    warn!(
                        handler = subscription.handler.name(),
                        booking = %event.booking_id,
                        attempt,
                        %err,
                        "handler failed, delivery will be retried"
                    );
                    let delay = subscription.retry.delay_for(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    error!(
                        handler = subscription.handler.name(),
                        booking = %event.booking_id,
                        attempts = attempt,
                        %err,
                        "handler failed its final attempt, delivery abandoned"
                    );
                    self.failed.lock().await.push(FailedDelivery {
                        handler: subscription.handler.name().to_string(),
                        event: event.clone(),
                        attempts: attempt,
                        error: err.to_string(),
                        failed_at: Utc::now(),
                    });
                    return;
                }
            }
        }
    }

    /// Archive the event, then deliver it to every matching subscription.
    /// Handler outcomes never affect archival or each other.
    pub async fn dispatch(&self, event: DomainEvent) {
        self.archive.append(event.clone()).await;

        let subscriptions = self.subscriptions.read().await;
        for subscription in subscriptions
            .iter()
            .filter(|s| s.pattern == event.source.as_str())
        {
            self.deliver(subscription, &event).await;
        }
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        self.dispatch(event).await;
        Ok(())
    }
}
