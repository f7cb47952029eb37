// Implementations for the XP ledger.

pub mod json_store;

#[cfg(test)]
pub mod in_memory;

pub use json_store::JsonLedgerStore;

#[cfg(test)]
pub use in_memory::InMemoryLedgerStore;
