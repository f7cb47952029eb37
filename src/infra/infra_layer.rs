// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "leveling/leveling_store.rs"]
pub mod leveling;

#[path = "keepalive/keepalive_server.rs"]
pub mod keepalive;
