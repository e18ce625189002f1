use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use common::{FeatureCacheEntry, FeatureVector, SharedEntry};

type SymbolSlot = Arc<RwLock<VecDeque<SharedEntry>>>;

/// Bounded per-symbol cache of recent feature vectors.
///
/// Written by the feature pipeline, read by the decision engine. Each symbol
/// has its own lock, so a write to one symbol never waits on a reader of
/// another. Entries are `Arc`s and never mutated after insertion: a reader
/// gets either the previous latest vector or the new one, never a partial one.
pub struct FeatureStore {
    capacity: usize,
    slots: RwLock<HashMap<String, SymbolSlot>>,
}

impl FeatureStore {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "feature store capacity must be > 0");
        Self {
            capacity,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Append a vector for `symbol`, evicting the oldest entries beyond the bound.
    pub async fn put(&self, symbol: &str, vector: FeatureVector) -> SharedEntry {
        let entry = Arc::new(FeatureCacheEntry {
            symbol: symbol.to_string(),
            generated_at: vector.timestamp,
            vector,
        });

        let slot = self.slot(symbol).await;
        let mut queue = slot.write().await;
        queue.push_back(entry.clone());
        while queue.len() > self.capacity {
            queue.pop_front();
        }
        debug!(symbol, cached = queue.len(), "Updated feature cache");
        entry
    }

    /// Most recently inserted vector for `symbol`.
    pub async fn latest(&self, symbol: &str) -> Option<SharedEntry> {
        let slot = self.slots.read().await.get(symbol).cloned()?;
        let queue = slot.read().await;
        queue.back().cloned()
    }

    /// Number of cached vectors for `symbol`.
    pub async fn len(&self, symbol: &str) -> usize {
        match self.slots.read().await.get(symbol).cloned() {
            Some(slot) => slot.read().await.len(),
            None => 0,
        }
    }

    /// Cached vectors for `symbol`, oldest first.
    pub async fn history(&self, symbol: &str) -> Vec<SharedEntry> {
        match self.slots.read().await.get(symbol).cloned() {
            Some(slot) => slot.read().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    async fn slot(&self, symbol: &str) -> SymbolSlot {
        if let Some(slot) = self.slots.read().await.get(symbol) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(symbol.to_string())
            .or_default()
            .clone()
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
