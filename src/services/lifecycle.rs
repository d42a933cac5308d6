//! Reservation Lifecycle Manager
//!
//! Staff-performed status transitions (approve, reject, mark returned) and
//! owner-performed withdrawal of pending lines. Every mutation invalidates
//! the availability cache for the touched item and emits an event.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{BookingRequest as BookingRequestEntity, Reservation as ReservationEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::availability::AvailabilityService;

/// Service owning all status transitions of reservation lines.
#[derive(Clone)]
pub struct ReservationLifecycleService {
    db: Arc<DatabaseConnection>,
    availability: AvailabilityService,
    event_sender: EventSender,
}

impl ReservationLifecycleService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        availability: AvailabilityService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            availability,
            event_sender,
        }
    }

    fn require_staff(user: &CurrentUser) -> Result<(), ServiceError> {
        if user.is_staff {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "reservation review requires staff privileges".to_string(),
            ))
        }
    }

    async fn find_line(&self, id: Uuid) -> Result<reservation::Model, ServiceError> {
        ReservationEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("reservation {} not found", id)))
    }

    /// Staff approves a pending line. The line keeps occupying stock, so
    /// availability is unchanged in value but the cache is still dropped.
    #[instrument(skip(self, user), fields(staff_id = %user.id))]
    pub async fn approve(
        &self,
        user: &CurrentUser,
        reservation_id: Uuid,
    ) -> Result<reservation::Model, ServiceError> {
        Self::require_staff(user)?;
        let line = self.find_line(reservation_id).await?;

        if line.status() != Some(ReservationStatus::Pending) {
            return Err(ServiceError::ValidationError(format!(
                "reservation {} is {}, only pending lines can be approved",
                reservation_id, line.status
            )));
        }

        let item_id = line.item_id;
        let mut active: reservation::ActiveModel = line.into();
        active.status = Set(ReservationStatus::Approved.as_str().to_string());
        let updated = active.update(&*self.db).await?;

        self.availability.invalidate_item(item_id);
        self.event_sender
            .send_or_log(Event::ReservationApproved {
                reservation_id,
                item_id,
            })
            .await;

        info!(reservation_id = %reservation_id, "Reservation approved");
        Ok(updated)
    }

    /// Staff rejects a pending line. The reason is mandatory and stored on
    /// the line; rejection releases the held stock.
    #[instrument(skip(self, user, reason), fields(staff_id = %user.id))]
    pub async fn reject(
        &self,
        user: &CurrentUser,
        reservation_id: Uuid,
        reason: &str,
    ) -> Result<reservation::Model, ServiceError> {
        Self::require_staff(user)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::InvalidInput(
                "a rejection reason is required".to_string(),
            ));
        }

        let line = self.find_line(reservation_id).await?;
        if line.status() != Some(ReservationStatus::Pending) {
            return Err(ServiceError::ValidationError(format!(
                "reservation {} is {}, only pending lines can be rejected",
                reservation_id, line.status
            )));
        }

        let item_id = line.item_id;
        let mut active: reservation::ActiveModel = line.into();
        active.status = Set(ReservationStatus::Rejected.as_str().to_string());
        active.rejection_reason = Set(Some(reason.to_string()));
        let updated = active.update(&*self.db).await?;

        self.availability.invalidate_item(item_id);
        self.event_sender
            .send_or_log(Event::ReservationRejected {
                reservation_id,
                item_id,
                reason: reason.to_string(),
            })
            .await;

        info!(reservation_id = %reservation_id, "Reservation rejected");
        Ok(updated)
    }

    /// Staff marks an approved line's equipment as physically returned,
    /// which releases the held stock for the rest of the interval.
    #[instrument(skip(self, user), fields(staff_id = %user.id))]
    pub async fn mark_returned(
        &self,
        user: &CurrentUser,
        reservation_id: Uuid,
    ) -> Result<reservation::Model, ServiceError> {
        Self::require_staff(user)?;
        let line = self.find_line(reservation_id).await?;

        if line.status() != Some(ReservationStatus::Approved) {
            return Err(ServiceError::ValidationError(format!(
                "reservation {} is {}, only approved lines can be returned",
                reservation_id, line.status
            )));
        }

        let item_id = line.item_id;
        let mut active: reservation::ActiveModel = line.into();
        active.status = Set(ReservationStatus::Returned.as_str().to_string());
        let updated = active.update(&*self.db).await?;

        self.availability.invalidate_item(item_id);
        self.event_sender
            .send_or_log(Event::ReservationReturned {
                reservation_id,
                item_id,
            })
            .await;

        info!(reservation_id = %reservation_id, "Reservation returned");
        Ok(updated)
    }

    /// The owner withdraws a single pending line, which hard-deletes it.
    /// If it was the last line of its request, the now-empty request row is
    /// removed too.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn withdraw_line(
        &self,
        user: &CurrentUser,
        reservation_id: Uuid,
    ) -> Result<(), ServiceError> {
        let line = self.find_line(reservation_id).await?;

        if line.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "only the requester can withdraw a reservation".to_string(),
            ));
        }
        if line.status() != Some(ReservationStatus::Pending) {
            return Err(ServiceError::ValidationError(format!(
                "reservation {} is {}, only pending lines can be withdrawn",
                reservation_id, line.status
            )));
        }

        let item_id = line.item_id;
        let request_id = line.request_id;

        let txn = self.db.begin().await?;
        line.delete(&txn).await?;

        let remaining = ReservationEntity::find()
            .filter(reservation::Column::RequestId.eq(request_id))
            .count(&txn)
            .await?;
        if remaining == 0 {
            BookingRequestEntity::delete_by_id(request_id)
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        self.availability.invalidate_item(item_id);
        self.event_sender
            .send_or_log(Event::ReservationWithdrawn {
                reservation_id,
                item_id,
                user_id: user.id,
            })
            .await;

        info!(reservation_id = %reservation_id, "Reservation withdrawn");
        Ok(())
    }

    /// The owner withdraws a whole request: every line must still be
    /// pending, and all lines plus the request row are deleted in one
    /// transaction or not at all.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn withdraw_request(
        &self,
        user: &CurrentUser,
        request_id: Uuid,
    ) -> Result<(), ServiceError> {
        let request = BookingRequestEntity::find_by_id(request_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("booking request {} not found", request_id)))?;

        if request.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "only the requester can withdraw a booking request".to_string(),
            ));
        }

        let lines = ReservationEntity::find()
            .filter(reservation::Column::RequestId.eq(request_id))
            .all(&*self.db)
            .await?;

        if let Some(blocked) = lines
            .iter()
            .find(|l| l.status() != Some(ReservationStatus::Pending))
        {
            return Err(ServiceError::Conflict(format!(
                "reservation {} is {}, the request can no longer be withdrawn as a whole",
                blocked.id, blocked.status
            )));
        }

        let item_ids: Vec<Uuid> = lines.iter().map(|l| l.item_id).collect();
        let line_count = lines.len();

        let txn = self.db.begin().await?;
        ReservationEntity::delete_many()
            .filter(reservation::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await?;
        BookingRequestEntity::delete_by_id(request_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        for item_id in item_ids {
            self.availability.invalidate_item(item_id);
        }
        self.event_sender
            .send_or_log(Event::RequestWithdrawn {
                request_id,
                user_id: user.id,
                line_count,
            })
            .await;

        info!(request_id = %request_id, lines = line_count, "Booking request withdrawn");
        Ok(())
    }

    /// Staff review queue: reservation lines, optionally filtered by
    /// status, oldest first so the queue drains in submission order.
    #[instrument(skip(self, user))]
    pub async fn review_queue(
        &self,
        user: &CurrentUser,
        status: Option<ReservationStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<reservation::Model>, u64), ServiceError> {
        Self::require_staff(user)?;

        let mut query = ReservationEntity::find();
        if let Some(status) = status {
            query = query.filter(reservation::Column::Status.eq(status.as_str()));
        }
        let paginator = query
            .order_by_asc(reservation::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let lines = paginator.fetch_page(page).await?;
        Ok((lines, total))
    }
}
