// The XP service - ALL the business logic for the XP ledger and tier roles.
// Notice how this module has NO Discord-specific code (no serenity, no poise
// imports). Everything platform-shaped goes through the ports in
// `core::community`, so the whole flow can be exercised with a fake guild.

use super::ledger::{LedgerEntry, LedgerError, LedgerStore};
use super::notices;
use super::revoke_args::{display_name_matches, parse_revoke_args};
use super::role_policy::{RolePolicy, TierPlan};
use crate::core::community::{
    ChannelBindings, ChannelPoster, GuildGateway, MemberRef, MemberResolver, OutboundMessage,
    PlatformError, RoleMutator,
};
use thiserror::Error;

/// How many rows the leaderboard and the daily post show.
pub const LEADERBOARD_SIZE: usize = 10;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A leaderboard row whose user still resolves to a guild member.
///
/// `rank` is the position in the ledger ranking, so rows for members who
/// left leave a gap rather than shifting everyone up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMember {
    pub rank: usize,
    pub user_id: u64,
    pub display_name: String,
    pub xp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    /// Number of users in the ledger, resolvable or not.
    pub ledger_size: usize,
    pub rows: Vec<RankedMember>,
}

/// Returned when a tier role was actually assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPromotion {
    pub user_id: u64,
    pub label: String,
    pub revoked: Vec<String>,
    pub xp: u64,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum XpError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Owns the ledger store and the tier table.
///
/// One instance is created at startup and shared by every handler.
pub struct XpService<S: LedgerStore> {
    store: S,
    policy: RolePolicy,
    bindings: ChannelBindings,
}

impl<S: LedgerStore> XpService<S> {
    pub fn new(store: S, policy: RolePolicy, bindings: ChannelBindings) -> Self {
        Self {
            store,
            policy,
            bindings,
        }
    }

    pub fn bindings(&self) -> &ChannelBindings {
        &self.bindings
    }

    /// Current XP. Never creates a ledger entry.
    pub async fn xp_for(&self, user_id: u64) -> Result<u64, XpError> {
        Ok(self.store.get_xp(user_id).await?)
    }

    /// Add `amount` (which may be negative) and persist. Floors at zero.
    pub async fn grant(&self, user_id: u64, amount: i64) -> Result<u64, XpError> {
        let xp = self.store.adjust_xp(user_id, amount).await?;
        tracing::info!(user_id, amount, total_xp = xp, "Granted XP");
        Ok(xp)
    }

    /// Subtract `amount` and persist. Floors at zero.
    pub async fn revoke(&self, user_id: u64, amount: i64) -> Result<u64, XpError> {
        let delta = amount.checked_neg().unwrap_or(i64::MAX);
        let xp = self.store.adjust_xp(user_id, delta).await?;
        tracing::info!(user_id, amount, total_xp = xp, "Revoked XP");
        Ok(xp)
    }

    /// The top `limit` ledger entries, XP descending, ties by ascending user id.
    pub async fn ranked_entries(&self, limit: usize) -> Result<Vec<LedgerEntry>, XpError> {
        let mut entries = self.store.entries().await?;
        entries.sort_by(|a, b| b.xp.cmp(&a.xp).then(a.user_id.cmp(&b.user_id)));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Top ten, with display names. Users who left the guild are skipped.
    pub async fn leaderboard<R: MemberResolver + ?Sized>(
        &self,
        resolver: &R,
        guild_id: u64,
    ) -> Result<Leaderboard, XpError> {
        let ledger_size = self.store.entries().await?.len();
        let top = self.ranked_entries(LEADERBOARD_SIZE).await?;

        let mut rows = Vec::with_capacity(top.len());
        for (index, entry) in top.into_iter().enumerate() {
            match resolver.resolve_member(guild_id, entry.user_id).await? {
                Some(member) => rows.push(RankedMember {
                    rank: index + 1,
                    user_id: entry.user_id,
                    display_name: member.display_name,
                    xp: entry.xp,
                }),
                None => {
                    tracing::debug!(guild_id, user_id = entry.user_id, "Skipping departed member")
                }
            }
        }

        Ok(Leaderboard { ledger_size, rows })
    }

    /// First member whose display name matches, ignoring case.
    pub async fn find_member_by_display_name<R: MemberResolver + ?Sized>(
        &self,
        resolver: &R,
        guild_id: u64,
        display_name: &str,
    ) -> Result<Option<MemberRef>, XpError> {
        let members = resolver.list_members(guild_id).await?;
        Ok(members
            .into_iter()
            .find(|m| display_name_matches(&m.display_name, display_name)))
    }

    /// Public "just gained" notice. Skipped if the guild has no announcements channel.
    pub async fn announce_gain<P: ChannelPoster + ?Sized>(
        &self,
        poster: &P,
        guild_id: u64,
        member: &MemberRef,
        amount: i64,
        reason: Option<&str>,
    ) -> Result<bool, XpError> {
        let text = notices::gain_announcement(member, amount, reason);
        Ok(poster
            .post(guild_id, &self.bindings.announcements, OutboundMessage::Text(text))
            .await?)
    }

    /// Bring the member's tier role in line with `xp`.
    ///
    /// Does nothing if they already hold the right tier, if they are below the
    /// first threshold, or if the guild has no role with that name. Otherwise
    /// removes every other tier role they hold, adds the new one and posts a
    /// single level-up notice.
    pub async fn sync_tier<G: RoleMutator + ChannelPoster + ?Sized>(
        &self,
        gateway: &G,
        guild_id: u64,
        member: &MemberRef,
        xp: u64,
    ) -> Result<Option<TierPromotion>, XpError> {
        let held = gateway.held_roles(guild_id, member.user_id).await?;

        let (assign, revoke) = match self.policy.plan(xp, held.as_slice()) {
            TierPlan::NoTier | TierPlan::AlreadyHeld => return Ok(None),
            TierPlan::Assign { assign, revoke } => (assign, revoke),
        };

        if !gateway.role_exists(guild_id, &assign).await? {
            tracing::debug!(guild_id, role = %assign, "Tier role missing from guild, skipping");
            return Ok(None);
        }

        if !revoke.is_empty() {
            gateway
                .remove_roles(guild_id, member.user_id, &revoke)
                .await?;
        }
        if !gateway.add_role(guild_id, member.user_id, &assign).await? {
            return Ok(None);
        }

        let notice = notices::level_up(member, &assign);
        gateway
            .post(
                guild_id,
                &self.bindings.announcements,
                OutboundMessage::Text(notice),
            )
            .await?;

        Ok(Some(TierPromotion {
            user_id: member.user_id,
            label: assign,
            revoked: revoke,
            xp,
        }))
    }

    /// Whether the user holds the admin role that unlocks grant and revoke.
    pub async fn holds_admin_role<R: RoleMutator + ?Sized>(
        &self,
        gateway: &R,
        guild_id: u64,
        user_id: u64,
    ) -> Result<bool, XpError> {
        let held = gateway.held_roles(guild_id, user_id).await?;
        Ok(held.iter().any(|role| *role == self.bindings.admin_role))
    }

    /// The grant command once its channel and role checks have passed:
    /// credit the ledger, announce the gain, then sync the tier role.
    /// Returns the acknowledgement for the invoking channel.
    pub async fn grant_command<G: RoleMutator + ChannelPoster + ?Sized>(
        &self,
        gateway: &G,
        guild_id: u64,
        target: &MemberRef,
        amount: i64,
        reason: Option<&str>,
    ) -> Result<String, XpError> {
        let total = self.grant(target.user_id, amount).await?;
        self.announce_gain(gateway, guild_id, target, amount, reason)
            .await?;
        let promotion = self.sync_tier(gateway, guild_id, target, total).await?;
        log_promotion(guild_id, promotion.as_ref());

        Ok(notices::grant_ack(target, amount, reason))
    }

    /// The revoke command once its channel check has passed.
    ///
    /// Unlike grant, a missing admin role gets a visible reply. Arguments are
    /// `<display name...> <amount>`; nothing is written unless they parse and
    /// the name matches a member. Returns the reply for the invoking channel.
    pub async fn revoke_command<G: RoleMutator + ChannelPoster + MemberResolver + ?Sized>(
        &self,
        gateway: &G,
        guild_id: u64,
        invoker_id: u64,
        args: &str,
        prefix: &str,
    ) -> Result<String, XpError> {
        if !self.holds_admin_role(gateway, guild_id, invoker_id).await? {
            return Ok(notices::missing_admin_role(&self.bindings.admin_role));
        }

        let parsed = match parse_revoke_args(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected revoke arguments");
                return Ok(notices::revoke_usage(prefix));
            }
        };

        let Some(target) = self
            .find_member_by_display_name(gateway, guild_id, &parsed.display_name)
            .await?
        else {
            return Ok(notices::member_not_found(&parsed.display_name));
        };

        let total = self.revoke(target.user_id, parsed.amount).await?;
        let promotion = self.sync_tier(gateway, guild_id, &target, total).await?;
        log_promotion(guild_id, promotion.as_ref());

        Ok(notices::revoke_confirmation(&target, parsed.amount))
    }

    /// Post the daily card into one guild's leaderboard channel.
    /// Returns `false` if the guild has no such channel.
    pub async fn post_daily_leaderboard<G: GuildGateway + ?Sized>(
        &self,
        gateway: &G,
        guild_id: u64,
        footer: &str,
    ) -> Result<bool, XpError> {
        if !gateway
            .channel_exists(guild_id, &self.bindings.leaderboard)
            .await?
        {
            return Ok(false);
        }

        let board = self.leaderboard(gateway, guild_id).await?;
        let card = notices::daily_leaderboard_card(
            &board.rows,
            footer.to_string(),
            gateway.bot_avatar_url(),
        );
        Ok(gateway
            .post(guild_id, &self.bindings.leaderboard, card)
            .await?)
    }

    /// Post the daily card into every guild the bot is in. Returns how many
    /// guilds received it; per-guild failures are logged and skipped.
    pub async fn announce_daily_leaderboards<G: GuildGateway + ?Sized>(
        &self,
        gateway: &G,
        footer: &str,
    ) -> usize {
        let mut posted = 0;
        for guild_id in gateway.guild_ids() {
            match self.post_daily_leaderboard(gateway, guild_id, footer).await {
                Ok(true) => posted += 1,
                Ok(false) => tracing::debug!(guild_id, "No leaderboard channel, skipping"),
                Err(e) => tracing::warn!(guild_id, error = %e, "Daily leaderboard failed"),
            }
        }
        posted
    }
}

fn log_promotion(guild_id: u64, promotion: Option<&TierPromotion>) {
    if let Some(promotion) = promotion {
        tracing::info!(
            guild_id,
            user_id = promotion.user_id,
            total_xp = promotion.xp,
            role = %promotion.label,
            revoked = ?promotion.revoked,
            "User leveled up"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::community::testing::{member, RecordingGateway, RoleCall};
    use crate::core::leveling::role_policy::default_tiers;
    use crate::infra::leveling::InMemoryLedgerStore;

    const ANNOUNCE: &str = "📢│announcement";
    const BOARD: &str = "🏆||leaderboard";

    fn make_service() -> XpService<InMemoryLedgerStore> {
        XpService::new(
            InMemoryLedgerStore::new(),
            RolePolicy::new(default_tiers()).unwrap(),
            ChannelBindings::default(),
        )
    }

    fn tiered_gateway() -> RecordingGateway {
        default_tiers()
            .iter()
            .fold(RecordingGateway::new(), |g, t| g.with_role(&t.label))
            .with_channel(ANNOUNCE)
    }

    #[tokio::test]
    async fn grant_then_query_on_empty_ledger() {
        let service = make_service();
        assert_eq!(service.xp_for(1).await.unwrap(), 0);

        let xp = service.grant(1, 150).await.unwrap();
        assert_eq!(xp, 150);
        let policy = RolePolicy::new(default_tiers()).unwrap();
        assert_eq!(policy.resolve_role(xp).map(|t| t.threshold), Some(100));
        assert_eq!(service.xp_for(1).await.unwrap(), 150);
    }

    #[tokio::test]
    async fn revoke_floors_at_zero() {
        let service = make_service();
        service.grant(1, 30).await.unwrap();

        assert_eq!(service.revoke(1, 50).await.unwrap(), 0);
        assert_eq!(service.xp_for(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reading_does_not_create_entries() {
        let service = make_service();
        service.xp_for(99).await.unwrap();
        assert!(service.ranked_entries(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn promotion_swaps_roles_and_announces_once() {
        let service = make_service();
        let ada = member(1, "Ada");
        let gateway = tiered_gateway().with_member(ada.clone(), &["🥉 Member"]);

        service.grant(1, 600).await.unwrap();
        let xp = service.grant(1, 400).await.unwrap();
        let promotion = service.sync_tier(&gateway, 10, &ada, xp).await.unwrap();

        assert_eq!(
            promotion.map(|p| p.label),
            Some("🏅 Local Leader".to_string())
        );
        assert_eq!(
            gateway.role_calls(),
            vec![
                RoleCall::Removed {
                    user_id: 1,
                    labels: vec!["🥉 Member".to_string()]
                },
                RoleCall::Added {
                    user_id: 1,
                    label: "🏅 Local Leader".to_string()
                },
            ]
        );
        let notices = gateway.posts_to(ANNOUNCE);
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0],
            OutboundMessage::Text("🎉 `Ada` just leveled up to **🏅 Local Leader**!".to_string())
        );
    }

    #[tokio::test]
    async fn gain_is_announced_publicly() {
        let service = make_service();
        let gateway = RecordingGateway::new().with_channel(ANNOUNCE);

        let posted = service
            .announce_gain(&gateway, 10, &member(7, "Ada"), 150, Some("workshop"))
            .await
            .unwrap();

        assert!(posted);
        assert_eq!(
            gateway.posts_to(ANNOUNCE),
            vec![OutboundMessage::Text(
                "✨ <@7> just gained **150 XP**! 📝 workshop".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn no_notice_when_tier_unchanged() {
        let service = make_service();
        let ada = member(1, "Ada");
        let gateway = tiered_gateway().with_member(ada.clone(), &["🥉 Member"]);

        let xp = service.grant(1, 700).await.unwrap();
        let promotion = service.sync_tier(&gateway, 10, &ada, xp).await.unwrap();

        assert!(promotion.is_none());
        assert!(gateway.role_calls().is_empty());
        assert!(gateway.posts().is_empty());
    }

    #[tokio::test]
    async fn revoke_reassigns_lower_tier() {
        let service = make_service();
        let ada = member(1, "Ada");
        let gateway = tiered_gateway().with_member(ada.clone(), &["🏅 Local Leader"]);

        service.grant(1, 1000).await.unwrap();
        let xp = service.revoke(1, 600).await.unwrap();
        service.sync_tier(&gateway, 10, &ada, xp).await.unwrap();

        assert_eq!(gateway.held(1), vec!["🏑 Rookie".to_string()]);
    }

    #[tokio::test]
    async fn missing_guild_role_skips_sync() {
        let service = make_service();
        let ada = member(1, "Ada");
        let gateway = RecordingGateway::new()
            .with_channel(ANNOUNCE)
            .with_member(ada.clone(), &["🏑 Rookie"]);

        let promotion = service.sync_tier(&gateway, 10, &ada, 600).await.unwrap();

        assert!(promotion.is_none());
        assert!(gateway.role_calls().is_empty());
        assert_eq!(gateway.held(1), vec!["🏑 Rookie".to_string()]);
    }

    #[tokio::test]
    async fn leaderboard_is_sorted_and_skips_departed_members() {
        let service = make_service();
        service.grant(1, 300).await.unwrap();
        service.grant(2, 900).await.unwrap();
        service.grant(3, 500).await.unwrap();
        service.grant(4, 500).await.unwrap();

        // User 3 left the guild.
        let gateway = RecordingGateway::new()
            .with_member(member(1, "Ada"), &[])
            .with_member(member(2, "Bo"), &[])
            .with_member(member(4, "Cy"), &[]);

        let board = service.leaderboard(&gateway, 10).await.unwrap();
        assert_eq!(board.ledger_size, 4);

        let ranks: Vec<_> = board
            .rows
            .iter()
            .map(|r| (r.rank, r.display_name.as_str(), r.xp))
            .collect();
        assert_eq!(ranks, vec![(1, "Bo", 900), (3, "Cy", 500), (4, "Ada", 300)]);
        assert!(board.rows.windows(2).all(|w| w[0].xp >= w[1].xp));
    }

    #[tokio::test]
    async fn leaderboard_caps_at_ten() {
        let service = make_service();
        let mut gateway = RecordingGateway::new();
        for id in 1..=15u64 {
            service.grant(id, id as i64 * 10).await.unwrap();
            gateway = gateway.with_member(member(id, &format!("user{id}")), &[]);
        }

        let board = service.leaderboard(&gateway, 10).await.unwrap();
        assert_eq!(board.rows.len(), LEADERBOARD_SIZE);
        assert_eq!(board.rows[0].xp, 150);
    }

    #[tokio::test]
    async fn finds_first_display_name_match() {
        let service = make_service();
        let gateway = RecordingGateway::new()
            .with_member(member(1, "Ada"), &[])
            .with_member(member(2, "ada"), &[]);

        let found = service
            .find_member_by_display_name(&gateway, 10, "ADA")
            .await
            .unwrap();
        assert_eq!(found.map(|m| m.user_id), Some(1));

        let missing = service
            .find_member_by_display_name(&gateway, 10, "Bo")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    const ADMIN: u64 = 900;

    fn admin_gateway() -> RecordingGateway {
        tiered_gateway().with_member(member(ADMIN, "Mod"), &["XP Manager"])
    }

    #[tokio::test]
    async fn grant_command_credits_announces_and_promotes() {
        let service = make_service();
        let ada = member(1, "Ada");
        let gateway = admin_gateway().with_member(ada.clone(), &[]);

        let reply = service
            .grant_command(&gateway, 10, &ada, 150, Some("workshop"))
            .await
            .unwrap();

        assert_eq!(reply, "✅ <@1> received 150 XP! 📝 workshop");
        assert_eq!(service.xp_for(1).await.unwrap(), 150);
        assert_eq!(
            gateway.posts_to(ANNOUNCE),
            vec![
                OutboundMessage::Text("✨ <@1> just gained **150 XP**! 📝 workshop".to_string()),
                OutboundMessage::Text("🎉 `Ada` just leveled up to **🏑 Rookie**!".to_string()),
            ]
        );
        assert_eq!(gateway.held(1), vec!["🏑 Rookie".to_string()]);
    }

    #[tokio::test]
    async fn admin_role_is_read_from_the_invoker() {
        let service = make_service();
        let gateway = admin_gateway().with_member(member(1, "Ada"), &["🥉 Member"]);

        assert!(service.holds_admin_role(&gateway, 10, ADMIN).await.unwrap());
        assert!(!service.holds_admin_role(&gateway, 10, 1).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_command_by_display_name() {
        let service = make_service();
        let gateway = admin_gateway().with_member(member(1, "Jane Doe"), &["🥉 Member"]);
        service.grant(1, 600).await.unwrap();

        let reply = service
            .revoke_command(&gateway, 10, ADMIN, "jane doe 200", "!")
            .await
            .unwrap();

        assert_eq!(reply, "✅ `Jane Doe` lost **200 XP**.");
        assert_eq!(service.xp_for(1).await.unwrap(), 400);
        assert_eq!(gateway.held(1), vec!["🏑 Rookie".to_string()]);
    }

    #[tokio::test]
    async fn revoke_command_with_bad_amount_changes_nothing() {
        let service = make_service();
        let gateway = admin_gateway().with_member(member(1, "Jane"), &[]);

        let reply = service
            .revoke_command(&gateway, 10, ADMIN, "Jane lots", "!")
            .await
            .unwrap();

        assert_eq!(reply, notices::revoke_usage("!"));
        assert!(service.ranked_entries(10).await.unwrap().is_empty());
        assert!(gateway.role_calls().is_empty());
    }

    #[tokio::test]
    async fn revoke_command_tells_non_admins_why() {
        let service = make_service();
        let gateway = admin_gateway().with_member(member(1, "Jane"), &[]);
        service.grant(1, 600).await.unwrap();

        let reply = service
            .revoke_command(&gateway, 10, 1, "Jane 50", "!")
            .await
            .unwrap();

        assert_eq!(reply, notices::missing_admin_role("XP Manager"));
        assert_eq!(service.xp_for(1).await.unwrap(), 600);
    }

    #[tokio::test]
    async fn revoke_command_reports_unknown_names() {
        let service = make_service();
        let gateway = admin_gateway();

        let reply = service
            .revoke_command(&gateway, 10, ADMIN, "Nobody 50", "!")
            .await
            .unwrap();

        assert_eq!(reply, notices::member_not_found("Nobody"));
        assert!(service.ranked_entries(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn daily_post_goes_to_guilds_with_a_leaderboard_channel() {
        let service = make_service();
        service.grant(1, 300).await.unwrap();

        let gateway = RecordingGateway::new()
            .with_guild(10)
            .with_guild(20)
            .with_channel(BOARD)
            .with_member(member(1, "Ada"), &[]);

        let posted = service
            .announce_daily_leaderboards(&gateway, "Updated daily at 8AM")
            .await;
        assert_eq!(posted, 2);
        assert_eq!(gateway.posts_to(BOARD).len(), 2);

        let bare = RecordingGateway::new()
            .with_guild(10)
            .with_member(member(1, "Ada"), &[]);
        assert_eq!(
            service
                .announce_daily_leaderboards(&bare, "Updated daily at 8AM")
                .await,
            0
        );
        // Channel-less guilds are skipped before any member lookups.
        assert_eq!(bare.lookups(), 0);
    }
}
