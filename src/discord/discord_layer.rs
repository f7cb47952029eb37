// Discord layer - commands, event handlers and the serenity adapter.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "events/member_events.rs"]
pub mod events;

#[path = "gateway/serenity_gateway.rs"]
pub mod gateway;

#[path = "schedule/daily_leaderboard.rs"]
pub mod daily_leaderboard;

// Re-export command types for convenience
pub use commands::leveling::{Data, Error};
