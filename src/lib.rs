//! Availability and reservation core for a shared-equipment booking
//! platform: real-time stock computation, validated booking submission,
//! staff-reviewed reservation lifecycle, and per-user draft carts.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod observability;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::IntoParams;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::AppServices;

/// Shared application state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>, event_sender: EventSender) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Standard success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::observability::current_request_id()
                .map(|rid| rid.as_str().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta::capture(),
        }
    }
}

/// A page of results plus the totals clients need to render pagination.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Common pagination query parameters. Pages are 1-based on the wire.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn zero_based_page(&self) -> u64 {
        self.page() - 1
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

async fn api_status() -> impl IntoResponse {
    Json(ApiResponse::ok(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Liveness plus a database round trip.
async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    state.db.ping().await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({
        "status": "healthy",
    }))))
}

/// All /api/v1 routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        // Catalog and availability
        .route(
            "/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route("/items/:id", get(handlers::items::get_item))
        .route(
            "/items/:id/availability",
            get(handlers::items::item_availability),
        )
        .route(
            "/items/:id/reservations",
            get(handlers::items::item_reservations),
        )
        // Booking submission and owner withdrawal
        .route(
            "/bookings",
            get(handlers::bookings::list_my_bookings).post(handlers::bookings::submit_booking),
        )
        .route("/bookings/:id", delete(handlers::bookings::withdraw_booking))
        // Staff review queue and transitions
        .route("/reservations", get(handlers::approvals::review_queue))
        .route(
            "/reservations/:id",
            delete(handlers::bookings::withdraw_reservation),
        )
        .route(
            "/reservations/:id/approve",
            post(handlers::approvals::approve_reservation),
        )
        .route(
            "/reservations/:id/reject",
            post(handlers::approvals::reject_reservation),
        )
        .route(
            "/reservations/:id/return",
            post(handlers::approvals::return_reservation),
        )
        // Draft cart
        .route(
            "/cart",
            get(handlers::carts::get_cart).delete(handlers::carts::clear_cart),
        )
        .route(
            "/cart/lines",
            post(handlers::carts::add_cart_line).delete(handlers::carts::remove_cart_line),
        )
        .route("/cart/offerable", get(handlers::carts::cart_offerable))
        .route(
            "/cart/snapshot",
            get(handlers::carts::cart_snapshot).put(handlers::carts::restore_cart),
        )
}

/// The full application router, without the outer middleware layers that
/// `main` applies.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api-docs/openapi.json",
            get(openapi::serve_openapi),
        )
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}
