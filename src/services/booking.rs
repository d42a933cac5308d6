//! Booking Validator
//!
//! Admits proposed booking lines against temporal rules and fresh
//! availability, then persists the request and its lines atomically. This is
//! the system's principal concurrency control point: a per-item advisory
//! lock is held across the validate+insert sequence so that two concurrent
//! submissions cannot both pass on the same stock.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{booking_request, BookingRequest as BookingRequestEntity, Item as ItemEntity, Reservation as ReservationEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::availability::AvailabilityService;

/// One proposed (item, quantity, interval) line of a booking submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookingLine {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
}

impl BookingLine {
    fn overlaps(&self, other: &BookingLine) -> bool {
        self.start_date <= other.end_date && self.end_date >= other.start_date
    }
}

/// Result of a successful submission: the persisted request and its lines,
/// all in status pending.
#[derive(Debug, Clone)]
pub struct SubmittedBooking {
    pub request: booking_request::Model,
    pub lines: Vec<reservation::Model>,
}

/// Service validating and persisting booking submissions.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<DatabaseConnection>,
    availability: AvailabilityService,
    event_sender: EventSender,
    /// How far into the future a booking may end, in days.
    horizon_days: i64,
    /// Advisory locks serializing validate+insert per item.
    item_locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BookingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        availability: AvailabilityService,
        event_sender: EventSender,
        horizon_days: i64,
    ) -> Self {
        Self {
            db,
            availability,
            event_sender,
            horizon_days,
            item_locks: Arc::new(DashMap::new()),
        }
    }

    /// Validates and persists a booking submission.
    ///
    /// Lines are checked in submission order and the first failure aborts
    /// the whole request with no rows written; every failure names the
    /// offending line. On success one request row plus its reservation
    /// lines are inserted in a single transaction, all pending.
    #[instrument(skip(self, lines, note), fields(user_id = %user_id, line_count = lines.len()))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        lines: Vec<BookingLine>,
        note: Option<String>,
    ) -> Result<SubmittedBooking, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "a booking request needs at least one line".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        for (idx, line) in lines.iter().enumerate() {
            self.validate_line_dates(idx, line, today)?;
        }

        // Serialize the availability check and the insert per item. Locks
        // are acquired in sorted item order so that two multi-item
        // submissions cannot deadlock each other.
        let distinct_items: BTreeSet<Uuid> = lines.iter().map(|l| l.item_id).collect();
        let mut guards: Vec<OwnedMutexGuard<()>> = Vec::with_capacity(distinct_items.len());
        for item_id in &distinct_items {
            let lock = self
                .item_locks
                .entry(*item_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }

        // Authoritative stock check, fresh at validation time and
        // independent of any client-held draft state.
        for (idx, line) in lines.iter().enumerate() {
            let item = ItemEntity::find_by_id(line.item_id).one(&*self.db).await?;
            let Some(item) = item else {
                return Err(ServiceError::NotFound(format!(
                    "line {}: item {} not found",
                    idx, line.item_id
                )));
            };

            // Cache bypassed on purpose: a slow presentation read can
            // re-insert a stale value after another submission's
            // invalidation, and the lock cannot protect against that.
            let available = self
                .availability
                .available_fresh(line.item_id, line.start_date, line.end_date)
                .await?;

            // Earlier lines of this same submission are not yet persisted
            // but will be; the submission may not overbook itself.
            let claimed_by_earlier: i32 = lines[..idx]
                .iter()
                .filter(|earlier| earlier.item_id == line.item_id && earlier.overlaps(line))
                .map(|earlier| earlier.quantity)
                .sum();

            let offerable = (available - claimed_by_earlier).max(0);
            if line.quantity > offerable {
                return Err(ServiceError::InsufficientStock(format!(
                    "line {}: item \"{}\" has {} available for {} to {}, requested {}",
                    idx, item.name, offerable, line.start_date, line.end_date, line.quantity
                )));
            }
        }

        // All lines admitted: persist request + lines in one transaction so
        // no orphaned request can survive a failed line insert.
        let txn = self.db.begin().await?;

        let request = booking_request::ActiveModel {
            user_id: Set(user_id),
            note: Set(note),
            status: Set(ReservationStatus::Pending.as_str().to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut persisted = Vec::with_capacity(lines.len());
        for line in &lines {
            let model = reservation::ActiveModel {
                request_id: Set(request.id),
                user_id: Set(user_id),
                item_id: Set(line.item_id),
                quantity: Set(line.quantity),
                start_date: Set(line.start_date),
                start_time: Set(line.start_time),
                end_date: Set(line.end_date),
                end_time: Set(line.end_time),
                status: Set(ReservationStatus::Pending.as_str().to_string()),
                rejection_reason: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            persisted.push(model);
        }

        txn.commit().await?;

        for item_id in &distinct_items {
            self.availability.invalidate_item(*item_id);
        }

        self.event_sender
            .send_or_log(Event::BookingSubmitted {
                request_id: request.id,
                user_id,
                line_count: persisted.len(),
            })
            .await;

        info!(request_id = %request.id, lines = persisted.len(), "Booking request admitted");

        Ok(SubmittedBooking {
            request,
            lines: persisted,
        })
    }

    fn validate_line_dates(
        &self,
        idx: usize,
        line: &BookingLine,
        today: NaiveDate,
    ) -> Result<(), ServiceError> {
        line.validate()
            .map_err(|e| ServiceError::ValidationError(format!("line {}: {}", idx, e)))?;

        if line.start_date < today {
            return Err(ServiceError::ValidationError(format!(
                "line {}: start date {} is in the past",
                idx, line.start_date
            )));
        }

        if line.end_date < line.start_date {
            return Err(ServiceError::ValidationError(format!(
                "line {}: end date {} is before start date {}",
                idx, line.end_date, line.start_date
            )));
        }

        if line.start_date == line.end_date {
            if let (Some(start_time), Some(end_time)) = (line.start_time, line.end_time) {
                if start_time >= end_time {
                    return Err(ServiceError::ValidationError(format!(
                        "line {}: start time must be before end time on a same-day booking",
                        idx
                    )));
                }
            }
        }

        let horizon = today + Duration::days(self.horizon_days);
        if line.end_date > horizon {
            return Err(ServiceError::ValidationError(format!(
                "line {}: booking ends {} which is beyond the {}-day horizon",
                idx, line.end_date, self.horizon_days
            )));
        }

        Ok(())
    }

    /// The caller's booking requests, newest first, with their lines.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(booking_request::Model, Vec<reservation::Model>)>, ServiceError> {
        let requests = BookingRequestEntity::find()
            .filter(booking_request::Column::UserId.eq(user_id))
            .order_by_desc(booking_request::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut out = Vec::with_capacity(requests.len());
        for request in requests {
            let lines = ReservationEntity::find()
                .filter(reservation::Column::RequestId.eq(request.id))
                .order_by_asc(reservation::Column::StartDate)
                .all(&*self.db)
                .await?;
            out.push((request, lines));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: (i32, u32, u32), end: (i32, u32, u32)) -> BookingLine {
        BookingLine {
            item_id: Uuid::new_v4(),
            quantity: 1,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            start_time: None,
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            end_time: None,
        }
    }

    #[test]
    fn lines_overlap_on_shared_boundary() {
        let a = line((2024, 6, 1), (2024, 6, 5));
        let mut b = line((2024, 6, 5), (2024, 6, 10));
        b.item_id = a.item_id;
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = line((2024, 6, 6), (2024, 6, 10));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn quantity_below_one_fails_validation() {
        let mut l = line((2024, 6, 1), (2024, 6, 5));
        l.quantity = 0;
        assert!(l.validate().is_err());
        l.quantity = 1;
        assert!(l.validate().is_ok());
    }
}
