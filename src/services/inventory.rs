//! Equipment catalog management.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::entities::{item, Item as ItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewItem {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub category: String,
    /// Physical units owned. Omitted means a single unit.
    pub total_quantity: Option<i32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Service managing the equipment catalog.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds an item to the catalog. Staff only.
    #[instrument(skip(self, user, new_item), fields(staff_id = %user.id, name = %new_item.name))]
    pub async fn create_item(
        &self,
        user: &CurrentUser,
        new_item: NewItem,
    ) -> Result<item::Model, ServiceError> {
        if !user.is_staff {
            return Err(ServiceError::Forbidden(
                "catalog management requires staff privileges".to_string(),
            ));
        }
        new_item.validate()?;

        if let Some(qty) = new_item.total_quantity {
            if qty < 0 {
                return Err(ServiceError::ValidationError(
                    "total quantity cannot be negative".to_string(),
                ));
            }
        }

        let created = item::ActiveModel {
            name: Set(new_item.name),
            category: Set(new_item.category),
            total_quantity: Set(new_item.total_quantity),
            description: Set(new_item.description),
            image_url: Set(new_item.image_url),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ItemCreated(created.id))
            .await;
        info!(item_id = %created.id, "Item created");
        Ok(created)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<item::Model, ServiceError> {
        ItemEntity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", item_id)))
    }

    /// Catalog listing, alphabetical, paginated.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<item::Model>, u64), ServiceError> {
        let paginator = ItemEntity::find()
            .order_by_asc(item::Column::Name)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page).await?;
        Ok((items, total))
    }
}
