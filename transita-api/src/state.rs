use std::sync::Arc;
use transita_core::repository::{BookingRepository, CancelledBookingLedger};
use transita_pipeline::StatusTransitionService;
use transita_queue::SubmissionQueue;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<SubmissionQueue>,
    pub store: Arc<dyn BookingRepository>,
    pub ledger: Arc<dyn CancelledBookingLedger>,
    pub transitions: Arc<StatusTransitionService>,
}
