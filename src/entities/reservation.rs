use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approval status of a single reservation line.
///
/// Transitions are one-way: `pending → approved | rejected`, and
/// `approved → returned` once the equipment comes back. Pending and
/// approved lines count as committed stock; rejected and returned do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Returned => "returned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "approved" => Some(ReservationStatus::Approved),
            "rejected" => Some(ReservationStatus::Rejected),
            "returned" => Some(ReservationStatus::Returned),
            _ => None,
        }
    }

    /// Whether a line in this status counts against an item's stock.
    pub fn occupies_stock(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Approved
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Rejected | ReservationStatus::Returned
        )
    }
}

/// A single item/quantity/date-interval commitment.
///
/// Item, quantity, and dates are immutable after creation; only the status
/// (and the rejection reason alongside it) is ever mutated, and only by a
/// staff-performed transition. A pending line may instead be hard-deleted
/// by its owner.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
    // Stored as a string in the DB; converted through ReservationStatus.
    pub status: String,
    /// Present only when the line was rejected.
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn status(&self) -> Option<ReservationStatus> {
        ReservationStatus::from_str(&self.status)
    }

    /// Committed quantity of this line, with the defensive fallback for
    /// malformed legacy rows (null/zero/negative count as one unit).
    pub fn effective_quantity(&self) -> i32 {
        if self.quantity <= 0 {
            1
        } else {
            self.quantity
        }
    }

    /// Inclusive date-interval overlap: a reservation ending exactly on the
    /// query's start date still occupies that day.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::booking_request::Entity",
        from = "Column::RequestId",
        to = "super::booking_request::Column::Id"
    )]
    BookingRequest,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::booking_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingRequest.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
        } else {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_conversion() {
        assert_eq!(ReservationStatus::Pending.as_str(), "pending");
        assert_eq!(ReservationStatus::Returned.as_str(), "returned");
        assert_eq!(
            ReservationStatus::from_str("approved"),
            Some(ReservationStatus::Approved)
        );
        assert_eq!(ReservationStatus::from_str("cancelled"), None);
    }

    #[test]
    fn occupancy_by_status() {
        assert!(ReservationStatus::Pending.occupies_stock());
        assert!(ReservationStatus::Approved.occupies_stock());
        assert!(!ReservationStatus::Rejected.occupies_stock());
        assert!(!ReservationStatus::Returned.occupies_stock());
    }

    fn line(start: (i32, u32, u32), end: (i32, u32, u32)) -> Model {
        Model {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity: 1,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            start_time: None,
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            end_time: None,
            status: ReservationStatus::Pending.as_str().to_string(),
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn overlap_boundaries_are_inclusive() {
        let a = line((2024, 6, 1), (2024, 6, 5));
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        // Query starting exactly where the reservation ends still overlaps.
        assert!(a.overlaps(day(5), day(10)));
        // One day later does not.
        assert!(!a.overlaps(day(6), day(10)));
    }

    #[test]
    fn malformed_quantity_counts_as_one_unit() {
        let mut l = line((2024, 6, 1), (2024, 6, 5));
        l.quantity = 0;
        assert_eq!(l.effective_quantity(), 1);
        l.quantity = -2;
        assert_eq!(l.effective_quantity(), 1);
        l.quantity = 3;
        assert_eq!(l.effective_quantity(), 3);
    }
}
