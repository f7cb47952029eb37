// A recording fake of the platform ports for core tests.

use super::ports::{
    ChannelPoster, GuildDirectory, MemberRef, MemberResolver, OutboundMessage, PlatformError,
    RoleMutator,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCall {
    Removed { user_id: u64, labels: Vec<String> },
    Added { user_id: u64, label: String },
}

#[derive(Default)]
pub struct RecordingGateway {
    channels: HashSet<String>,
    guild_roles: HashSet<String>,
    members: Vec<MemberRef>,
    guilds: Vec<u64>,
    held: Mutex<HashMap<u64, Vec<String>>>,
    posts: Mutex<Vec<(u64, String, OutboundMessage)>>,
    role_calls: Mutex<Vec<RoleCall>>,
    lookups: AtomicUsize,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, name: &str) -> Self {
        self.channels.insert(name.to_string());
        self
    }

    pub fn with_role(mut self, name: &str) -> Self {
        self.guild_roles.insert(name.to_string());
        self
    }

    pub fn with_guild(mut self, guild_id: u64) -> Self {
        self.guilds.push(guild_id);
        self
    }

    pub fn with_member(mut self, member: MemberRef, roles: &[&str]) -> Self {
        self.held.get_mut().unwrap().insert(
            member.user_id,
            roles.iter().map(|r| r.to_string()).collect(),
        );
        self.members.push(member);
        self
    }

    pub fn posts(&self) -> Vec<(u64, String, OutboundMessage)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn posts_to(&self, channel: &str) -> Vec<OutboundMessage> {
        self.posts()
            .into_iter()
            .filter(|(_, c, _)| c == channel)
            .map(|(_, _, m)| m)
            .collect()
    }

    pub fn role_calls(&self) -> Vec<RoleCall> {
        self.role_calls.lock().unwrap().clone()
    }

    /// How many single-member lookups were made.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn held(&self, user_id: u64) -> Vec<String> {
        self.held
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn member(user_id: u64, display_name: &str) -> MemberRef {
    MemberRef {
        user_id,
        display_name: display_name.to_string(),
        avatar_url: None,
    }
}

#[async_trait]
impl RoleMutator for RecordingGateway {
    async fn held_roles(&self, _: u64, user_id: u64) -> Result<Vec<String>, PlatformError> {
        Ok(self.held(user_id))
    }

    async fn role_exists(&self, _: u64, label: &str) -> Result<bool, PlatformError> {
        Ok(self.guild_roles.contains(label))
    }

    async fn remove_roles(
        &self,
        _: u64,
        user_id: u64,
        labels: &[String],
    ) -> Result<(), PlatformError> {
        self.held
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .retain(|r| !labels.contains(r));
        self.role_calls.lock().unwrap().push(RoleCall::Removed {
            user_id,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn add_role(&self, _: u64, user_id: u64, label: &str) -> Result<bool, PlatformError> {
        if !self.guild_roles.contains(label) {
            return Ok(false);
        }
        self.held
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push(label.to_string());
        self.role_calls.lock().unwrap().push(RoleCall::Added {
            user_id,
            label: label.to_string(),
        });
        Ok(true)
    }
}

#[async_trait]
impl ChannelPoster for RecordingGateway {
    async fn channel_exists(&self, _: u64, channel: &str) -> Result<bool, PlatformError> {
        Ok(self.channels.contains(channel))
    }

    async fn post(
        &self,
        guild_id: u64,
        channel: &str,
        message: OutboundMessage,
    ) -> Result<bool, PlatformError> {
        if !self.channels.contains(channel) {
            return Ok(false);
        }
        self.posts
            .lock()
            .unwrap()
            .push((guild_id, channel.to_string(), message));
        Ok(true)
    }
}

#[async_trait]
impl MemberResolver for RecordingGateway {
    async fn list_members(&self, _: u64) -> Result<Vec<MemberRef>, PlatformError> {
        Ok(self.members.clone())
    }

    async fn resolve_member(&self, _: u64, user_id: u64) -> Result<Option<MemberRef>, PlatformError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.members.iter().find(|m| m.user_id == user_id).cloned())
    }
}

impl GuildDirectory for RecordingGateway {
    fn guild_ids(&self) -> Vec<u64> {
        self.guilds.clone()
    }

    fn bot_avatar_url(&self) -> Option<String> {
        Some("https://cdn.example/bot.png".to_string())
    }
}
