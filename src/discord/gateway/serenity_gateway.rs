// Serenity implementation of the community ports.
//
// The core addresses guilds, users, roles and channels by id and name; this
// adapter turns those into HTTP calls. Channels and roles are looked up by
// exact name on every call, so renaming one in Discord takes effect at once.

use crate::core::community::{
    Card, ChannelPoster, GuildDirectory, MemberRef, MemberResolver, OutboundMessage,
    PlatformError, RoleMutator,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Audit-log reason attached to every role change.
const ROLE_REASON: &str = "XP tier update";

/// Page size for member listing (Discord's maximum).
const MEMBER_PAGE: u64 = 1000;

impl From<serenity::Error> for PlatformError {
    fn from(err: serenity::Error) -> Self {
        PlatformError(err.to_string())
    }
}

#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityGateway {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }

    pub fn from_context(ctx: &serenity::Context) -> Self {
        Self::new(ctx.http.clone(), ctx.cache.clone())
    }

    async fn find_channel(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<serenity::ChannelId>, PlatformError> {
        let channels = self
            .http
            .get_channels(serenity::GuildId::new(guild_id))
            .await?;
        Ok(channels
            .iter()
            .find(|c| is_postable(c.kind) && c.name == name)
            .map(|c| c.id))
    }

    async fn guild_roles(&self, guild_id: u64) -> Result<Vec<serenity::Role>, PlatformError> {
        Ok(self
            .http
            .get_guild_roles(serenity::GuildId::new(guild_id))
            .await?)
    }
}

/// Project a serenity member onto the core's view of one.
pub fn member_ref(member: &serenity::Member) -> MemberRef {
    MemberRef {
        user_id: member.user.id.get(),
        display_name: member.display_name().to_string(),
        avatar_url: Some(member.face()),
    }
}

/// Discord answers 404 for users who left the guild. Anything else (rate
/// limits, outages) is a real failure.
fn is_unknown_member(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response)) => {
            response.status_code.as_u16() == 404
        }
        _ => false,
    }
}

/// Only plain text and announcement channels can take our posts.
fn is_postable(kind: serenity::ChannelType) -> bool {
    matches!(
        kind,
        serenity::ChannelType::Text | serenity::ChannelType::News
    )
}

pub fn card_embed(card: &Card) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(card.title.as_str())
        .colour(card.colour);

    if let Some(description) = &card.description {
        embed = embed.description(description.as_str());
    }
    if let Some(thumbnail) = &card.thumbnail {
        embed = embed.thumbnail(thumbnail.as_str());
    }
    for field in &card.fields {
        embed = embed.field(field.name.as_str(), field.value.as_str(), field.inline);
    }
    if let Some(footer) = &card.footer {
        let mut footer = serenity::CreateEmbedFooter::new(footer.as_str());
        if let Some(icon) = &card.footer_icon {
            footer = footer.icon_url(icon.as_str());
        }
        embed = embed.footer(footer);
    }
    embed
}

fn render(message: OutboundMessage) -> serenity::CreateMessage {
    match message {
        OutboundMessage::Text(text) => serenity::CreateMessage::new().content(text),
        OutboundMessage::Card(card) => serenity::CreateMessage::new().embed(card_embed(&card)),
    }
}

#[async_trait]
impl RoleMutator for SerenityGateway {
    async fn held_roles(&self, guild_id: u64, user_id: u64) -> Result<Vec<String>, PlatformError> {
        let member = self
            .http
            .get_member(serenity::GuildId::new(guild_id), serenity::UserId::new(user_id))
            .await?;
        let roles = self.guild_roles(guild_id).await?;

        Ok(roles
            .into_iter()
            .filter(|role| member.roles.contains(&role.id))
            .map(|role| role.name)
            .collect())
    }

    async fn role_exists(&self, guild_id: u64, label: &str) -> Result<bool, PlatformError> {
        Ok(self
            .guild_roles(guild_id)
            .await?
            .iter()
            .any(|role| role.name == label))
    }

    async fn remove_roles(
        &self,
        guild_id: u64,
        user_id: u64,
        labels: &[String],
    ) -> Result<(), PlatformError> {
        let roles = self.guild_roles(guild_id).await?;
        for role in roles.iter().filter(|r| labels.contains(&r.name)) {
            self.http
                .remove_member_role(
                    serenity::GuildId::new(guild_id),
                    serenity::UserId::new(user_id),
                    role.id,
                    Some(ROLE_REASON),
                )
                .await?;
        }
        Ok(())
    }

    async fn add_role(
        &self,
        guild_id: u64,
        user_id: u64,
        label: &str,
    ) -> Result<bool, PlatformError> {
        let roles = self.guild_roles(guild_id).await?;
        let Some(role) = roles.iter().find(|r| r.name == label) else {
            return Ok(false);
        };

        self.http
            .add_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                role.id,
                Some(ROLE_REASON),
            )
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl ChannelPoster for SerenityGateway {
    async fn channel_exists(&self, guild_id: u64, channel: &str) -> Result<bool, PlatformError> {
        Ok(self.find_channel(guild_id, channel).await?.is_some())
    }

    async fn post(
        &self,
        guild_id: u64,
        channel: &str,
        message: OutboundMessage,
    ) -> Result<bool, PlatformError> {
        let Some(target) = self.find_channel(guild_id, channel).await? else {
            return Ok(false);
        };

        target.send_message(&*self.http, render(message)).await?;
        Ok(true)
    }
}

#[async_trait]
impl MemberResolver for SerenityGateway {
    async fn list_members(&self, guild_id: u64) -> Result<Vec<MemberRef>, PlatformError> {
        let guild = serenity::GuildId::new(guild_id);
        let mut members = Vec::new();
        let mut after = None;

        loop {
            let page = self
                .http
                .get_guild_members(guild, Some(MEMBER_PAGE), after)
                .await?;
            let page_len = page.len() as u64;
            after = page.last().map(|m| m.user.id.get());
            members.extend(page.iter().map(member_ref));

            if page_len < MEMBER_PAGE {
                break;
            }
        }

        Ok(members)
    }

    async fn resolve_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<MemberRef>, PlatformError> {
        let guild = serenity::GuildId::new(guild_id);
        let user = serenity::UserId::new(user_id);

        let cached = self.cache.member(guild, user).map(|m| member_ref(&m));
        if cached.is_some() {
            return Ok(cached);
        }

        match self.http.get_member(guild, user).await {
            Ok(member) => Ok(Some(member_ref(&member))),
            Err(e) if is_unknown_member(&e) => {
                tracing::debug!(guild_id, user_id, "User is no longer a member");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl GuildDirectory for SerenityGateway {
    fn guild_ids(&self) -> Vec<u64> {
        self.cache.guilds().iter().map(|g| g.get()).collect()
    }

    fn bot_avatar_url(&self) -> Option<String> {
        self.cache.current_user().avatar_url()
    }
}
