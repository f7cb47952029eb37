// Runtime configuration, read from the environment (and `.env` via dotenv).
//
// Everything except the token has a default, so a bare `DISCORD_TOKEN=...`
// is enough to run the bot against the stock channel layout.

use crate::core::schedule::DailySchedule;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_LEDGER_PATH: &str = "xp_data.json";
pub const DEFAULT_LEADERBOARD_TIME: &str = "08:00";
pub const DEFAULT_LEADERBOARD_TZ: &str = "UTC";
pub const DEFAULT_KEEPALIVE_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable! Create a .env file with your bot token.")]
    Missing(&'static str),

    #[error("Invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub ledger_path: PathBuf,
    pub schedule: DailySchedule,
    pub keepalive_addr: SocketAddr,
    pub command_prefix: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let ledger_path = get("XP_LEDGER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH));

        let time_raw = get("LEADERBOARD_TIME").unwrap_or_else(|| DEFAULT_LEADERBOARD_TIME.into());
        let at = NaiveTime::parse_from_str(time_raw.trim(), "%H:%M").map_err(|e| {
            ConfigError::Invalid {
                key: "LEADERBOARD_TIME",
                value: time_raw.clone(),
                reason: format!("expected HH:MM ({e})"),
            }
        })?;

        let tz_raw = get("LEADERBOARD_TZ").unwrap_or_else(|| DEFAULT_LEADERBOARD_TZ.into());
        let tz: Tz = tz_raw.trim().parse().map_err(|e| ConfigError::Invalid {
            key: "LEADERBOARD_TZ",
            value: tz_raw.clone(),
            reason: format!("{e}"),
        })?;

        let addr_raw = get("KEEPALIVE_ADDR").unwrap_or_else(|| DEFAULT_KEEPALIVE_ADDR.into());
        let keepalive_addr = addr_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "KEEPALIVE_ADDR",
                value: addr_raw.clone(),
                reason: e.to_string(),
            })?;

        let command_prefix = get("COMMAND_PREFIX")
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.into());

        Ok(Self {
            token,
            ledger_path,
            schedule: DailySchedule::new(at, tz),
            keepalive_addr,
            command_prefix,
        })
    }
}
