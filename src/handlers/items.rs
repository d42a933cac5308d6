//! Catalog and availability endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::ServiceError;
use crate::handlers::common::{ItemView, ReservationView};
use crate::services::inventory::NewItem;
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// POST /items (staff only)
pub async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewItem>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.create_item(&user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ItemView::from(item))),
    ))
}

/// GET /items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .inventory
        .list_items(query.zero_based_page(), query.per_page())
        .await?;

    Ok(Json(ApiResponse::ok(PaginatedResponse {
        items: items.into_iter().map(ItemView::from).collect::<Vec<_>>(),
        total,
        page: query.page(),
        per_page: query.per_page(),
    })))
}

/// GET /items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.get_item(item_id).await?;
    Ok(Json(ApiResponse::ok(ItemView::from(item))))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityView {
    pub item_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    pub available: i32,
}

/// GET /items/:id/availability
///
/// With both `start` and `end`, the remaining stock over that interval;
/// with neither, the item's raw physical quantity. Exactly one of the two
/// is a malformed query.
pub async fn item_availability(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let available = match (query.start, query.end) {
        (Some(start), Some(end)) => {
            if end < start {
                return Err(ServiceError::ValidationError(format!(
                    "end date {} is before start date {}",
                    end, start
                )));
            }
            state
                .services
                .availability
                .available(item_id, start, end)
                .await?
        }
        (None, None) => state.services.availability.raw_total(item_id).await?,
        _ => {
            return Err(ServiceError::ValidationError(
                "start and end must be supplied together".to_string(),
            ))
        }
    };

    Ok(Json(ApiResponse::ok(AvailabilityView {
        item_id,
        start: query.start,
        end: query.end,
        available,
    })))
}

/// GET /items/:id/reservations
///
/// Every reservation of the item, ordered by start date, for rendering a
/// busy/free calendar.
pub async fn item_reservations(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    // 404 on an unknown item beats an empty calendar for a typo'd id.
    state.services.inventory.get_item(item_id).await?;

    let lines = state.services.availability.list_for_item(item_id).await?;
    Ok(Json(ApiResponse::ok(
        lines
            .into_iter()
            .map(ReservationView::from)
            .collect::<Vec<_>>(),
    )))
}
