//! Availability Calculator
//!
//! Computes the remaining stock of an item over a date interval by
//! subtracting overlapping committed reservations (pending and approved)
//! from the item's physical quantity.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::AvailabilityCache;
use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{item, Item as ItemEntity, Reservation as ReservationEntity};
use crate::errors::ServiceError;

/// Service computing real-time remaining stock.
#[derive(Clone)]
pub struct AvailabilityService {
    db: Arc<DatabaseConnection>,
    cache: AvailabilityCache,
}

impl AvailabilityService {
    pub fn new(db: Arc<DatabaseConnection>, cache: AvailabilityCache) -> Self {
        Self { db, cache }
    }

    /// Remaining quantity of `item_id` over the inclusive interval
    /// `[start, end]`, never negative. A missing item yields zero.
    ///
    /// Memoized for presentation reads. A slow reader can re-insert a result
    /// computed before a competing mutation's invalidation, so this value
    /// may be stale; admission must use `available_fresh` instead.
    #[instrument(skip(self))]
    pub async fn available(
        &self,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i32, ServiceError> {
        if let Some(cached) = self.cache.get(item_id, start, end) {
            return Ok(cached);
        }

        match self.compute(item_id, start, end).await? {
            Some(fresh) => {
                self.cache.insert(item_id, start, end, fresh);
                Ok(fresh)
            }
            // Unknown ids are not memoized: nothing ever invalidates them,
            // and the endpoint is open to arbitrary queries.
            None => Ok(0),
        }
    }

    /// Remaining quantity read straight from the database, skipping the
    /// cache. This is the authoritative read the booking validator performs
    /// under the per-item lock.
    pub async fn available_fresh(
        &self,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i32, ServiceError> {
        Ok(self.compute(item_id, start, end).await?.unwrap_or(0))
    }

    /// `None` when the item does not exist.
    async fn compute(
        &self,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<i32>, ServiceError> {
        let db = &*self.db;

        let item = ItemEntity::find_by_id(item_id).one(db).await?;
        let Some(item) = item else {
            return Ok(None);
        };
        let total = item.effective_total();

        // Inclusive overlap on both ends: a reservation ending exactly on the
        // query's start date still occupies that day.
        let overlapping = ReservationEntity::find()
            .filter(reservation::Column::ItemId.eq(item_id))
            .filter(reservation::Column::Status.is_in([
                ReservationStatus::Pending.as_str(),
                ReservationStatus::Approved.as_str(),
            ]))
            .filter(reservation::Column::StartDate.lte(end))
            .filter(reservation::Column::EndDate.gte(start))
            .all(db)
            .await?;

        let occupied: i32 = overlapping.iter().map(|r| r.effective_quantity()).sum();

        Ok(Some((total - occupied).max(0)))
    }

    /// The item's raw physical quantity, used by presentation when no
    /// interval is supplied. Missing item yields zero.
    #[instrument(skip(self))]
    pub async fn raw_total(&self, item_id: Uuid) -> Result<i32, ServiceError> {
        let item = ItemEntity::find_by_id(item_id).one(&*self.db).await?;
        Ok(item.as_ref().map(item::Model::effective_total).unwrap_or(0))
    }

    /// All reservations for an item, ordered by start date, for rendering a
    /// busy/free calendar.
    #[instrument(skip(self))]
    pub async fn list_for_item(
        &self,
        item_id: Uuid,
    ) -> Result<Vec<reservation::Model>, ServiceError> {
        let lines = ReservationEntity::find()
            .filter(reservation::Column::ItemId.eq(item_id))
            .order_by_asc(reservation::Column::StartDate)
            .all(&*self.db)
            .await?;
        Ok(lines)
    }

    /// Drops cached results for the item so the next read recomputes.
    /// Called by every lifecycle mutation touching the item.
    pub fn invalidate_item(&self, item_id: Uuid) {
        self.cache.invalidate_item(item_id);
    }
}
