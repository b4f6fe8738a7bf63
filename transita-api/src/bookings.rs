use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use transita_core::booking::{Booking, BookingStatus, BookingSubmission, CancelledBooking};
use transita_pipeline::{TransitionContext, TransitionError};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub requester_id: String,
    pub bus_route_id: String,
    pub seats: Vec<String>,
    pub travel_date: String,
}

#[derive(Debug, Serialize)]
struct IntakeResponse {
    submission_id: Uuid,
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct BookingKeyParams {
    id: Uuid,
    bus_route_id: String,
}

#[derive(Debug, Deserialize)]
struct CancelledKeyParams {
    booking_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: BookingStatus,
    reason: Option<String>,
    cancelled_by: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(get_booking))
        .route("/v1/bookings/status", post(update_booking_status))
        .route("/v1/bookings/cancelled", get(get_cancelled_booking))
}

/// Intake: accepted into the pipeline, never a final status. Callers learn
/// the terminal outcome asynchronously.
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<IntakeResponse>), AppError> {
    let submission = BookingSubmission::new(
        req.requester_id,
        req.bus_route_id,
        req.seats,
        req.travel_date,
    );
    submission
        .validate()
        .map_err(|err| AppError::ValidationError(err.to_string()))?;

    let submission_id = submission.id;
    let outcome = state.queue.enqueue(submission).await;
    info!(submission = %submission_id, ?outcome, "booking submission accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(IntakeResponse {
            submission_id,
            status: "ACCEPTED",
        }),
    ))
}

async fn get_booking(
    State(state): State<AppState>,
    Query(params): Query<BookingKeyParams>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .store
        .get(params.id, &params.bus_route_id)
        .await
        .map_err(|err| AppError::Anyhow(err.into()))?
        .ok_or_else(|| {
            AppError::NotFoundError(format!("booking {} does not exist", params.id))
        })?;

    Ok(Json(booking))
}

/// External transition trigger: an operator or upstream system decides the
/// terminal state; the pipeline takes it from there.
async fn update_booking_status(
    State(state): State<AppState>,
    Query(params): Query<BookingKeyParams>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let ctx = TransitionContext {
        reason: req.reason,
        cancelled_by: req.cancelled_by,
    };

    let booking = state
        .transitions
        .transition(params.id, &params.bus_route_id, req.status, ctx)
        .await
        .map_err(|err| match err {
            TransitionError::NotFound { .. } => AppError::NotFoundError(err.to_string()),
            TransitionError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            TransitionError::Storage(err) => AppError::Anyhow(err.into()),
        })?;

    Ok(Json(booking))
}

async fn get_cancelled_booking(
    State(state): State<AppState>,
    Query(params): Query<CancelledKeyParams>,
) -> Result<Json<CancelledBooking>, AppError> {
    let entry = state
        .ledger
        .get(params.booking_id)
        .await
        .map_err(|err| AppError::Anyhow(err.into()))?
        .ok_or_else(|| {
            AppError::NotFoundError(format!(
                "no cancellation record for booking {}",
                params.booking_id
            ))
        })?;

    Ok(Json(entry))
}
