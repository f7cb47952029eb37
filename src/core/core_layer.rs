// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "leveling/mod.rs"]
pub mod leveling;

#[path = "community/mod.rs"]
pub mod community;

#[path = "schedule/daily_schedule.rs"]
pub mod schedule;
