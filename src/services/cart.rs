//! Local Draft Cart
//!
//! A bounded, in-memory staging area where a user assembles booking lines
//! before submitting them as one request. The cart is advisory only: it
//! holds no stock server-side, and admission is always re-validated by the
//! booking validator against fresh availability.

use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::availability::AvailabilityService;

/// One draft line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartLine {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
}

impl CartLine {
    /// Two lines occupy the same slot when item and interval (including the
    /// optional times) are identical. Adding to an occupied slot replaces
    /// the quantity instead of stacking a duplicate.
    fn same_slot(&self, other: &CartLine) -> bool {
        self.item_id == other.item_id
            && self.start_date == other.start_date
            && self.start_time == other.start_time
            && self.end_date == other.end_date
            && self.end_time == other.end_time
    }

    fn overlaps(&self, item_id: Uuid, start: NaiveDate, end: NaiveDate) -> bool {
        self.item_id == item_id && self.start_date <= end && self.end_date >= start
    }
}

/// A single user's draft cart. Plain data; all synchronization lives in the
/// service's map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DraftCart {
    lines: Vec<CartLine>,
}

impl DraftCart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Inserts the line, replacing an existing line in the same slot.
    /// Returns true when a slot was replaced rather than appended.
    fn upsert(&mut self, line: CartLine) -> bool {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.same_slot(&line)) {
            *existing = line;
            true
        } else {
            self.lines.push(line);
            false
        }
    }

    fn remove(&mut self, item_id: Uuid, start: NaiveDate, end: NaiveDate) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|l| !(l.item_id == item_id && l.start_date == start && l.end_date == end));
        self.lines.len() != before
    }

    /// Quantity this cart already holds for `item_id` over intervals
    /// overlapping `[start, end]`, excluding the slot identical to
    /// `replacing` so an idempotent replacement does not count against
    /// itself.
    fn held_overlapping(
        &self,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        replacing: Option<&CartLine>,
    ) -> i32 {
        self.lines
            .iter()
            .filter(|l| replacing.map_or(true, |r| !l.same_slot(r)))
            .filter(|l| l.overlaps(item_id, start, end))
            .map(|l| l.quantity)
            .sum()
    }
}

/// Service managing per-user draft carts.
#[derive(Clone)]
pub struct CartService {
    availability: AvailabilityService,
    carts: Arc<DashMap<Uuid, DraftCart>>,
    /// Maximum number of lines per cart.
    capacity: usize,
}

impl CartService {
    pub fn new(availability: AvailabilityService, capacity: usize) -> Self {
        Self {
            availability,
            carts: Arc::new(DashMap::new()),
            capacity,
        }
    }

    /// The user's cart, empty if they have none.
    pub fn get(&self, user_id: Uuid) -> DraftCart {
        self.carts
            .get(&user_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Quantity of `item_id` the user could still add to their cart for
    /// `[start, end]`: server-known availability minus what overlapping
    /// cart lines already claim. Advisory; admission re-checks.
    #[instrument(skip(self))]
    pub async fn offerable(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i32, ServiceError> {
        let available = self.availability.available(item_id, start, end).await?;
        let held = self
            .carts
            .get(&user_id)
            .map(|c| c.held_overlapping(item_id, start, end, None))
            .unwrap_or(0);
        Ok((available - held).max(0))
    }

    /// Adds a line to the user's cart, replacing an identical slot in
    /// place. Rejects lines that would exceed what the server plus the
    /// cart's own overlapping claims can still offer, and carts at
    /// capacity.
    #[instrument(skip(self, line), fields(item_id = %line.item_id, quantity = line.quantity))]
    pub async fn add(&self, user_id: Uuid, line: CartLine) -> Result<DraftCart, ServiceError> {
        line.validate()?;
        if line.end_date < line.start_date {
            return Err(ServiceError::ValidationError(format!(
                "end date {} is before start date {}",
                line.end_date, line.start_date
            )));
        }

        let available = self
            .availability
            .available(line.item_id, line.start_date, line.end_date)
            .await?;

        // Capacity and the overlap guard are checked against the cart as it
        // is right now; the entry lock below keeps the read and write of one
        // user's cart atomic.
        let mut entry = self.carts.entry(user_id).or_default();
        let cart = entry.value_mut();

        let held = cart.held_overlapping(
            line.item_id,
            line.start_date,
            line.end_date,
            Some(&line),
        );
        let offerable = (available - held).max(0);
        if line.quantity > offerable {
            return Err(ServiceError::InsufficientStock(format!(
                "item {} has {} offerable for {} to {}, requested {}",
                line.item_id, offerable, line.start_date, line.end_date, line.quantity
            )));
        }

        let replaces_slot = cart.lines.iter().any(|l| l.same_slot(&line));
        if !replaces_slot && cart.len() >= self.capacity {
            return Err(ServiceError::ValidationError(format!(
                "cart is full ({} lines)",
                self.capacity
            )));
        }

        cart.upsert(line);
        Ok(cart.clone())
    }

    /// Removes the line for `item_id` over exactly `[start, end]`.
    pub fn remove(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DraftCart, ServiceError> {
        let not_found = || {
            ServiceError::NotFound(format!(
                "no cart line for item {} from {} to {}",
                item_id, start, end
            ))
        };

        // get_mut, not entry: a miss must not seed an empty cart.
        let mut entry = self.carts.get_mut(&user_id).ok_or_else(not_found)?;
        let cart = entry.value_mut();
        if !cart.remove(item_id, start, end) {
            return Err(not_found());
        }
        Ok(cart.clone())
    }

    /// Empties the user's cart. Called after a successful submission.
    pub fn clear(&self, user_id: Uuid) {
        self.carts.remove(&user_id);
    }

    /// Serializes the cart for client-side persistence across sessions.
    pub fn snapshot(&self, user_id: Uuid) -> Result<serde_json::Value, ServiceError> {
        serde_json::to_value(self.get(user_id))
            .map_err(|e| ServiceError::InternalError(format!("cart snapshot failed: {}", e)))
    }

    /// Restores a previously snapshotted cart, replacing the current one.
    /// The snapshot is client-supplied, so it is validated line by line and
    /// bounded by the capacity like any other cart.
    pub fn restore(&self, user_id: Uuid, snapshot: serde_json::Value) -> Result<DraftCart, ServiceError> {
        let cart: DraftCart = serde_json::from_value(snapshot)
            .map_err(|e| ServiceError::InvalidInput(format!("malformed cart snapshot: {}", e)))?;

        if cart.len() > self.capacity {
            return Err(ServiceError::InvalidInput(format!(
                "snapshot holds {} lines, cart capacity is {}",
                cart.len(),
                self.capacity
            )));
        }
        for line in cart.lines() {
            line.validate()
                .map_err(|e| ServiceError::InvalidInput(format!("malformed cart line: {}", e)))?;
            if line.end_date < line.start_date {
                return Err(ServiceError::InvalidInput(
                    "malformed cart line: end date before start date".to_string(),
                ));
            }
        }

        self.carts.insert(user_id, cart.clone());
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: Uuid, qty: i32, start: u32, end: u32) -> CartLine {
        CartLine {
            item_id,
            quantity: qty,
            start_date: NaiveDate::from_ymd_opt(2024, 6, start).unwrap(),
            start_time: None,
            end_date: NaiveDate::from_ymd_opt(2024, 6, end).unwrap(),
            end_time: None,
        }
    }

    #[test]
    fn upsert_replaces_identical_slot() {
        let item = Uuid::new_v4();
        let mut cart = DraftCart::default();

        assert!(!cart.upsert(line(item, 1, 1, 5)));
        assert!(cart.upsert(line(item, 3, 1, 5)));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn different_interval_is_a_new_slot() {
        let item = Uuid::new_v4();
        let mut cart = DraftCart::default();

        cart.upsert(line(item, 1, 1, 5));
        cart.upsert(line(item, 1, 6, 10));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn held_overlapping_excludes_the_replaced_slot() {
        let item = Uuid::new_v4();
        let mut cart = DraftCart::default();
        cart.upsert(line(item, 2, 1, 5));
        cart.upsert(line(item, 1, 4, 8));

        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();

        assert_eq!(cart.held_overlapping(item, start, end, None), 3);

        // Replacing the first slot only counts the other overlapping line.
        let replacing = line(item, 2, 1, 5);
        assert_eq!(cart.held_overlapping(item, start, end, Some(&replacing)), 1);
    }

    #[test]
    fn remove_targets_exact_interval() {
        let item = Uuid::new_v4();
        let mut cart = DraftCart::default();
        cart.upsert(line(item, 1, 1, 5));
        cart.upsert(line(item, 1, 6, 10));

        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert!(cart.remove(item, start, end));
        assert!(!cart.remove(item, start, end));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let item = Uuid::new_v4();
        let mut cart = DraftCart::default();
        cart.upsert(line(item, 2, 1, 5));

        let value = serde_json::to_value(&cart).unwrap();
        let restored: DraftCart = serde_json::from_value(value).unwrap();
        assert_eq!(restored.lines(), cart.lines());
    }
}
