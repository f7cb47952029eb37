// Capability ports onto the chat platform.
//
// The core only needs a handful of things from a guild: which roles a member
// holds, a way to add/remove roles by name, a way to post into a channel by
// name, and member lookups. The Discord layer implements these over serenity;
// tests implement them with a recording fake.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Platform error: {0}")]
pub struct PlatformError(pub String);

/// The bits of a guild member the core cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub user_id: u64,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl MemberRef {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A rich message. Rendered as an embed by the Discord layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub colour: u32,
    pub thumbnail: Option<String>,
    pub fields: Vec<CardField>,
    pub footer: Option<String>,
    pub footer_icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Card(Card),
}

#[async_trait]
pub trait RoleMutator: Send + Sync {
    /// Names of the roles a member currently holds.
    async fn held_roles(&self, guild_id: u64, user_id: u64) -> Result<Vec<String>, PlatformError>;

    /// Whether the guild defines a role with this exact name.
    async fn role_exists(&self, guild_id: u64, label: &str) -> Result<bool, PlatformError>;

    /// Remove roles by name. Names the guild doesn't define are ignored.
    async fn remove_roles(
        &self,
        guild_id: u64,
        user_id: u64,
        labels: &[String],
    ) -> Result<(), PlatformError>;

    /// Add a role by name. Returns `false` if the guild doesn't define it.
    async fn add_role(&self, guild_id: u64, user_id: u64, label: &str)
        -> Result<bool, PlatformError>;
}

#[async_trait]
pub trait ChannelPoster: Send + Sync {
    /// Whether the guild has a text channel called `channel`.
    async fn channel_exists(&self, guild_id: u64, channel: &str) -> Result<bool, PlatformError>;

    /// Post into the guild's text channel called `channel`.
    /// Returns `false` without posting when no such channel exists.
    async fn post(
        &self,
        guild_id: u64,
        channel: &str,
        message: OutboundMessage,
    ) -> Result<bool, PlatformError>;
}

#[async_trait]
pub trait MemberResolver: Send + Sync {
    /// Every member of the guild, in the platform's order.
    async fn list_members(&self, guild_id: u64) -> Result<Vec<MemberRef>, PlatformError>;

    /// Look a user up in the guild. `None` when they're no longer a member.
    async fn resolve_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<MemberRef>, PlatformError>;
}

pub trait GuildDirectory: Send + Sync {
    /// Guilds the bot is currently in.
    fn guild_ids(&self) -> Vec<u64>;

    fn bot_avatar_url(&self) -> Option<String>;
}

/// Everything the XP service needs from the platform.
pub trait GuildGateway: RoleMutator + ChannelPoster + MemberResolver + GuildDirectory {}

impl<T> GuildGateway for T where T: RoleMutator + ChannelPoster + MemberResolver + GuildDirectory {}
