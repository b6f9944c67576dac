// palisade/src/state/blocklist.rs
//
// Explicit per-origin deny overrides, layered on top of the computed score.
// Mutations are visible to the very next evaluation on the same key: lookups
// go straight to the shared map, there is no caching layer in front of it.
// Blocking is advisory at the analyzer level (+80 via the ip analyzer); a
// blocked origin still accumulates its other signals and full reasons list.

use chrono::Utc;
use dashmap::DashMap;
use tracing::info;

use crate::events::BlockEntry;

#[derive(Default)]
pub struct BlockList {
    entries: DashMap<String, BlockEntry>,
}

impl BlockList {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    pub fn block(&self, origin: &str, reason: &str) {
        info!(origin, reason, "origin added to block list");
        self.entries.insert(
            origin.to_string(),
            BlockEntry {
                origin: origin.to_string(),
                reason: reason.to_string(),
                blocked_at: Utc::now(),
            },
        );
    }

    /// Returns true if the origin was present.
    pub fn unblock(&self, origin: &str) -> bool {
        let removed = self.entries.remove(origin).is_some();
        if removed {
            info!(origin, "origin removed from block list");
        }
        removed
    }

    pub fn is_blocked(&self, origin: &str) -> bool {
        self.entries.contains_key(origin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<BlockEntry> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}
