use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use transita_core::booking::{Booking, BookingSubmission};
use transita_core::repository::{BookingRepository, PutOutcome, StoreError};
use transita_queue::SubmissionQueue;

/// What to do with the queued message after a processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Retry(String),
    Fatal(String),
}

/// Turns a queued submission into a durable PENDING booking record, exactly
/// once per submission id no matter how often the queue redelivers.
pub struct BookingWorker {
    store: Arc<dyn BookingRepository>,
}

impl BookingWorker {
    pub fn new(store: Arc<dyn BookingRepository>) -> Self {
        Self { store }
    }

    pub async fn process_one(&self, submission: &BookingSubmission) -> Disposition {
        if let Err(err) = submission.validate() {
            return Disposition::Fatal(err.to_string());
        }

        match self.store.get(submission.id, &submission.bus_route_id).await {
            Ok(Some(_)) => {
                // Redelivery after a crash between store-write and ack.
                debug!(submission = %submission.id, "booking already recorded, acknowledging");
                Disposition::Ack
            }
            Ok(None) => {
                let booking = Booking::from_submission(submission);
                match self.store.put_if_absent(booking).await {
                    Ok(PutOutcome::Created) => {
                        info!(
                            booking = %submission.id,
                            route = %submission.bus_route_id,
                            "booking record created with status PENDING"
                        );
                        Disposition::Ack
                    }
                    Ok(PutOutcome::AlreadyExists) => {
                        // Lost a write race; the record exists, which is all
                        // that matters.
                        debug!(submission = %submission.id, "concurrent create observed, acknowledging");
                        Disposition::Ack
                    }
                    Err(StoreError::Transient(reason)) => Disposition::Retry(reason),
                }
            }
            Err(StoreError::Transient(reason)) => Disposition::Retry(reason),
        }
    }
}

/// Consumer loop: polls the submission queue and settles each delivery
/// according to the worker's disposition. Per-group serialization is the
/// queue's job, so any number of these loops may run side by side.
pub async fn run_worker(
    queue: Arc<SubmissionQueue>,
    worker: Arc<BookingWorker>,
    poll_timeout: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("booking worker started");
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("booking worker stopping");
                break;
            }
            delivery = queue.poll(poll_timeout) => {
                let Some(delivery) = delivery else { continue };

                match worker.process_one(&delivery.submission).await {
                    Disposition::Ack => {
                        if let Err(err) = queue.ack(delivery.receipt).await {
                            warn!(%err, "failed to acknowledge delivery");
                        }
                    }
                    Disposition::Retry(reason) => {
                        warn!(
                            submission = %delivery.submission.id,
                            attempt = delivery.attempt,
                            %reason,
                            "processing failed, submission released for redelivery"
                        );
                        if let Err(err) = queue.release(delivery.receipt).await {
                            warn!(%err, "failed to release delivery");
                        }
                    }
                    Disposition::Fatal(reason) => {
                        error!(
                            submission = %delivery.submission.id,
                            %reason,
                            "submission rejected as unprocessable"
                        );
                        if let Err(err) = queue.reject(delivery.receipt, &reason).await {
                            warn!(%err, "failed to reject delivery");
                        }
                    }
                }
            }
        }
    }
}
