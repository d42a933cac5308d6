//! OpenAPI document for the HTTP surface, served as plain JSON.

use axum::Json;
use utoipa::OpenApi;

use crate::errors::ErrorResponse;
use crate::handlers::approvals::RejectReservationRequest;
use crate::handlers::bookings::SubmitBookingRequest;
use crate::handlers::common::{BookingRequestView, ItemView, ReservationView};
use crate::handlers::items::AvailabilityView;
use crate::services::booking::BookingLine;
use crate::services::cart::{CartLine, DraftCart};
use crate::services::inventory::NewItem;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gearbook API",
        description = "Availability and reservation engine for a shared-equipment booking platform",
    ),
    components(schemas(
        ErrorResponse,
        ItemView,
        NewItem,
        AvailabilityView,
        ReservationView,
        BookingRequestView,
        BookingLine,
        SubmitBookingRequest,
        RejectReservationRequest,
        CartLine,
        DraftCart,
    )),
    tags(
        (name = "items", description = "Equipment catalog and availability"),
        (name = "bookings", description = "Booking submission and withdrawal"),
        (name = "reservations", description = "Staff review of reservation lines"),
        (name = "cart", description = "Per-user draft carts"),
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
