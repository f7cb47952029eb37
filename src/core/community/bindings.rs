// Names of the channels and roles the bot is wired to.
//
// Discord lookups are by exact name, decorative symbols included.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBindings {
    /// Public announcements: XP gains, level-ups, welcomes.
    pub announcements: String,
    /// Where grant/revoke commands are accepted.
    pub admin: String,
    /// Where members query their own XP.
    pub query: String,
    /// Leaderboard command and the daily post.
    pub leaderboard: String,
    /// Role required to grant or revoke XP.
    pub admin_role: String,
}

impl Default for ChannelBindings {
    fn default() -> Self {
        Self {
            announcements: "📢│announcement".to_string(),
            admin: "🔒│admin-xp-give".to_string(),
            query: "📈│xp-levels".to_string(),
            leaderboard: "🏆||leaderboard".to_string(),
            admin_role: "XP Manager".to_string(),
        }
    }
}
