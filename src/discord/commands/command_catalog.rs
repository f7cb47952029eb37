// Discord commands module.
// Each feature gets its own command file.

pub mod leveling;

// Bot presence management
pub mod presence;
