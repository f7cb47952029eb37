// This module handles bot presence and lifecycle events.
//
// Everything here is Discord-layer glue: we only work with Discord SDK types
// (Context, ActivityData, OnlineStatus) and keep the logic short.

use poise::serenity_prelude as serenity;

/// The activity line shown under the bot's name, e.g. "Watching !leaderboard".
pub fn activity_text(prefix: &str) -> String {
    format!("{prefix}leaderboard")
}

/// Called once the bot is ready so members see how to check the rankings.
pub fn on_ready(ctx: &serenity::Context, prefix: &str) {
    let activity = serenity::ActivityData::watching(activity_text(prefix));
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
