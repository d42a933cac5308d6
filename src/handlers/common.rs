//! View types shared across handlers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{booking_request, item, reservation};

/// A reservation line as returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationView {
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<reservation::Model> for ReservationView {
    fn from(model: reservation::Model) -> Self {
        Self {
            id: model.id,
            request_id: model.request_id,
            user_id: model.user_id,
            item_id: model.item_id,
            quantity: model.quantity,
            start_date: model.start_date,
            start_time: model.start_time,
            end_date: model.end_date,
            end_time: model.end_time,
            status: model.status,
            rejection_reason: model.rejection_reason,
            created_at: model.created_at,
        }
    }
}

/// A booking request with its reservation lines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingRequestView {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ReservationView>,
}

impl BookingRequestView {
    pub fn new(request: booking_request::Model, lines: Vec<reservation::Model>) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            note: request.note,
            created_at: request.created_at,
            lines: lines.into_iter().map(ReservationView::from).collect(),
        }
    }
}

/// A catalog item as returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemView {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Effective physical stock after the legacy-data fallback.
    pub total_quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<item::Model> for ItemView {
    fn from(model: item::Model) -> Self {
        let total_quantity = model.effective_total();
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            total_quantity,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at,
        }
    }
}
