//! Draft cart endpoints.
//!
//! The cart is advisory client state held server-side for convenience; it
//! never reserves stock. Submission happens through POST /bookings.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::ServiceError;
use crate::services::cart::CartLine;
use crate::{ApiResponse, AppState};

/// GET /cart
pub async fn get_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::ok(state.services.cart.get(user.id))))
}

/// POST /cart/lines
pub async fn add_cart_line(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(line): Json<CartLine>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.cart.add(user.id, line).await?;
    Ok(Json(ApiResponse::ok(cart)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CartLineQuery {
    pub item_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// DELETE /cart/lines
pub async fn remove_cart_line(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<CartLineQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state
        .services
        .cart
        .remove(user.id, query.item_id, query.start, query.end)?;
    Ok(Json(ApiResponse::ok(cart)))
}

/// DELETE /cart
pub async fn clear_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.cart.clear(user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /cart/offerable
///
/// How many units the caller could still add for the interval, after both
/// server-known reservations and their own overlapping cart lines.
pub async fn cart_offerable(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<CartLineQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let offerable = state
        .services
        .cart
        .offerable(user.id, query.item_id, query.start, query.end)
        .await?;
    Ok(Json(ApiResponse::ok(offerable)))
}

/// GET /cart/snapshot
pub async fn cart_snapshot(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::ok(state.services.cart.snapshot(user.id)?)))
}

/// PUT /cart/snapshot
pub async fn restore_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(snapshot): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.cart.restore(user.id, snapshot)?;
    Ok(Json(ApiResponse::ok(cart)))
}
