//! Booking submission and owner-side withdrawal endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::ServiceError;
use crate::handlers::common::BookingRequestView;
use crate::services::booking::BookingLine;
use crate::{ApiResponse, AppState};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitBookingRequest {
    pub lines: Vec<BookingLine>,
    #[serde(default)]
    pub note: Option<String>,
}

/// POST /bookings
///
/// Validates and persists the lines as one all-or-nothing request. A
/// successful submission also clears the caller's draft cart.
pub async fn submit_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SubmitBookingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let submitted = state
        .services
        .booking
        .submit(user.id, payload.lines, payload.note)
        .await?;

    state.services.cart.clear(user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(BookingRequestView::new(
            submitted.request,
            submitted.lines,
        ))),
    ))
}

/// GET /bookings
///
/// The caller's own booking requests, newest first.
pub async fn list_my_bookings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let requests = state.services.booking.list_for_user(user.id).await?;
    Ok(Json(ApiResponse::ok(
        requests
            .into_iter()
            .map(|(request, lines)| BookingRequestView::new(request, lines))
            .collect::<Vec<_>>(),
    )))
}

/// DELETE /bookings/:id
///
/// Withdraws the whole request; every line must still be pending.
pub async fn withdraw_booking(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .lifecycle
        .withdraw_request(&user, request_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /reservations/:id
///
/// Withdraws (hard-deletes) a single pending line owned by the caller.
pub async fn withdraw_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .lifecycle
        .withdraw_line(&user, reservation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
