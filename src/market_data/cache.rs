// =============================================================================
// DatasetCache — explicit history cache keyed by (symbol, start, end)
// =============================================================================
//
// One downloaded history per (symbol, date-range) request. The cache is a
// plain map with caller-controlled invalidation: nothing expires on its own,
// and a forced refresh drops exactly the keyed entry before refetching.
// Series are stored behind `Arc` so a hit hands out a shared handle without
// cloning the bars.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::Serialize;

use crate::types::PriceSeries;

/// Composite key that identifies one cached download.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
pub struct CacheKey {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}..{}", self.symbol, self.start, self.end)
    }
}

/// Thread-safe in-memory cache of fetched price histories.
pub struct DatasetCache {
    entries: RwLock<HashMap<CacheKey, Arc<PriceSeries>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the series for `key`, if present.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<PriceSeries>> {
        self.entries.read().get(key).cloned()
    }

    /// Store `series` under `key`, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, series: Arc<PriceSeries>) {
        self.entries.write().insert(key, series);
    }

    /// Drop the entry for `key`. Returns whether an entry was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached downloads.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}
