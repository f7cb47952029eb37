// This is the infra layer - it implements the traits defined in core.
// This file provides an IN-MEMORY implementation of LedgerStore.
//
// Nothing touches the disk, so the core tests use it to exercise the XP
// service without a temp file per test. The bot itself runs on the JSON store.

use crate::core::leveling::{apply_delta, LedgerEntry, LedgerError, LedgerStore};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory implementation of LedgerStore.
///
/// **DashMap:**
/// A concurrent HashMap that's safe to use across multiple async tasks.
/// The `entry()` API gives us an atomic read-modify-write per user.
pub struct InMemoryLedgerStore {
    /// Maps user_id -> XP
    data: DashMap<u64, u64>,
}

impl InMemoryLedgerStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_xp(&self, user_id: u64) -> Result<u64, LedgerError> {
        Ok(self.data.get(&user_id).map(|entry| *entry).unwrap_or(0))
    }

    async fn adjust_xp(&self, user_id: u64, delta: i64) -> Result<u64, LedgerError> {
        let mut entry = self.data.entry(user_id).or_insert(0);
        *entry = apply_delta(*entry, delta);
        Ok(*entry)
    }

    async fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .data
            .iter()
            .map(|entry| LedgerEntry {
                user_id: *entry.key(),
                xp: *entry.value(),
            })
            .collect())
    }
}

// Default trait implementation for convenient initialization
impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}
