//! Staff review endpoints: queue listing and status transitions.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::entities::reservation::ReservationStatus;
use crate::errors::ServiceError;
use crate::handlers::common::ReservationView;
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReviewQueueQuery {
    /// Filter by status (pending, approved, rejected, returned).
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// GET /reservations (staff only)
pub async fn review_queue(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReviewQueueQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(ReservationStatus::from_str(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("unknown status filter \"{}\"", raw))
        })?),
        None => None,
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let (lines, total) = state
        .services
        .lifecycle
        .review_queue(&user, status, page - 1, per_page)
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items: lines
            .into_iter()
            .map(ReservationView::from)
            .collect::<Vec<_>>(),
        total,
        page,
        per_page,
    })))
}

/// POST /reservations/:id/approve (staff only)
pub async fn approve_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .lifecycle
        .approve(&user, reservation_id)
        .await?;
    Ok(Json(ApiResponse::ok(ReservationView::from(updated))))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectReservationRequest {
    pub reason: String,
}

/// POST /reservations/:id/reject (staff only, reason mandatory)
pub async fn reject_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(reservation_id): Path<Uuid>,
    Json(payload): Json<RejectReservationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .lifecycle
        .reject(&user, reservation_id, &payload.reason)
        .await?;
    Ok(Json(ApiResponse::ok(ReservationView::from(updated))))
}

/// POST /reservations/:id/return (staff only)
pub async fn return_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .lifecycle
        .mark_returned(&user, reservation_id)
        .await?;
    Ok(Json(ApiResponse::ok(ReservationView::from(updated))))
}
