//! In-process availability cache.
//!
//! `available()` is a pure read over item + reservations, so its results can
//! be memoized per (item, interval). Every lifecycle mutation must call
//! `invalidate_item` so that subsequent reads reflect the new status
//! immediately.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

type CacheKey = (Uuid, NaiveDate, NaiveDate);

/// Coarse capacity bound. Query keys are client-chosen, so the map must not
/// grow without limit; a full cache is wiped rather than evicted piecemeal
/// since entries are cheap to recompute.
const MAX_ENTRIES: usize = 4096;

#[derive(Clone, Default)]
pub struct AvailabilityCache {
    entries: Arc<DashMap<CacheKey, i32>>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: Uuid, start: NaiveDate, end: NaiveDate) -> Option<i32> {
        self.entries.get(&(item_id, start, end)).map(|v| *v)
    }

    pub fn insert(&self, item_id: Uuid, start: NaiveDate, end: NaiveDate, available: i32) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.clear();
        }
        self.entries.insert((item_id, start, end), available);
    }

    /// Drops every cached interval for the item.
    pub fn invalidate_item(&self, item_id: Uuid) {
        self.entries.retain(|(cached_item, _, _), _| *cached_item != item_id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
