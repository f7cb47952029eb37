// The XP ledger port.
//
// The core defines WHAT it needs from storage (read one total, apply a signed
// delta, list everything) and the infra layer decides HOW that is persisted.

use async_trait::async_trait;
use thiserror::Error;

/// One row of the ledger: a user and their cumulative XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user_id: u64,
    pub xp: u64,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for persisting XP totals.
///
/// Implementations must treat a missing user as 0 XP without creating an
/// entry, and must floor every adjustment at zero individually.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current XP for a user, 0 if they have never been granted any.
    async fn get_xp(&self, user_id: u64) -> Result<u64, LedgerError>;

    /// Apply a signed delta, persist, and return the new total.
    async fn adjust_xp(&self, user_id: u64, delta: i64) -> Result<u64, LedgerError>;

    /// Every stored entry, in no particular order.
    async fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// `max(old + delta, 0)` without overflow in either direction.
pub fn apply_delta(old: u64, delta: i64) -> u64 {
    if delta >= 0 {
        old.saturating_add(delta as u64)
    } else {
        old.saturating_sub(delta.unsigned_abs())
    }
}
