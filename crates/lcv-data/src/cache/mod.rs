//! Memoization of fetch results
//!
//! Keyed by the exact request signature. Bounded capacity with oldest-first
//! eviction and an explicit clear; read and written from the single thread
//! that issues fetches, so the lock is uncontended in practice.

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::frame::ColumnTable;

/// Exact request signature. The window bounds are kept as their formatted
/// query strings so the key stays hashable and matches what was sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub star_id: String,
    pub from_jd: String,
    pub to_jd: String,
    pub max_obs: Option<usize>,
}

/// Bounded cache of downloaded observation tables.
pub struct FetchCache {
    state: RwLock<CacheState>,
    capacity: usize,
}

struct CacheState {
    entries: AHashMap<FetchKey, ColumnTable>,
    insert_order: Vec<FetchKey>,
}

impl FetchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: AHashMap::new(),
                insert_order: Vec::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &FetchKey) -> Option<ColumnTable> {
        self.state.read().entries.get(key).cloned()
    }

    /// Store a result, evicting the oldest entry once capacity is exceeded.
    pub fn put(&self, key: FetchKey, table: ColumnTable) {
        let mut state = self.state.write();
        if !state.entries.contains_key(&key) {
            if state.entries.len() >= self.capacity && !state.insert_order.is_empty() {
                let oldest = state.insert_order.remove(0);
                state.entries.remove(&oldest);
                debug!(star_id = %oldest.star_id, "cache entry evicted");
            }
            state.insert_order.push(key.clone());
        }
        state.entries.insert(key, table);
    }

    /// Drop every entry. Atomic relative to subsequent fetches.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.insert_order.clear();
        debug!("fetch cache cleared");
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
