// Discord commands for the XP ledger.
//
// **Notice the pattern:**
// 1. poise checks decide where the command may be used and by whom
// 2. Extract primitive data from Discord types
// 3. Call core service
// 4. Send the reply it returns
//
// This layer is THIN - no business logic, just translation.

use crate::core::community::MemberRef;
use crate::core::leveling::{notices, XpService};
use crate::core::schedule::DailySchedule;
use crate::discord::gateway::{member_ref, SerenityGateway};
use crate::infra::leveling::JsonLedgerStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub xp: Arc<XpService<JsonLedgerStore>>,
    pub schedule: DailySchedule,
    /// Cancelled on shutdown; background tasks watch it.
    pub shutdown: CancellationToken,
}

// ============================================================================
// CHECKS
// ============================================================================
// poise runs these in order before parsing arguments. A `false` is swallowed
// by the error hook, so a command used in the wrong channel (or by a
// non-admin, for givexp) gets no reply at all, not even a usage line.

fn channel_matches(channel: Option<&str>, wanted: &str) -> bool {
    channel == Some(wanted)
}

async fn in_channel(ctx: Context<'_>, wanted: &str) -> bool {
    let channel = ctx.guild_channel().await;
    channel_matches(channel.as_ref().map(|c| c.name.as_str()), wanted)
}

async fn in_admin_channel(ctx: Context<'_>) -> Result<bool, Error> {
    Ok(in_channel(ctx, &ctx.data().xp.bindings().admin).await)
}

async fn in_query_channel(ctx: Context<'_>) -> Result<bool, Error> {
    Ok(in_channel(ctx, &ctx.data().xp.bindings().query).await)
}

async fn in_leaderboard_channel(ctx: Context<'_>) -> Result<bool, Error> {
    Ok(in_channel(ctx, &ctx.data().xp.bindings().leaderboard).await)
}

async fn holds_admin_role(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    let gateway = SerenityGateway::from_context(ctx.serenity_context());
    let held = ctx
        .data()
        .xp
        .holds_admin_role(&gateway, guild_id.get(), ctx.author().id.get())
        .await?;
    Ok(held)
}

fn guild_of(ctx: Context<'_>) -> Result<u64, Error> {
    Ok(ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get())
}

async fn invoker_ref(ctx: Context<'_>) -> MemberRef {
    match ctx.author_member().await {
        Some(member) => member_ref(&member),
        None => MemberRef {
            user_id: ctx.author().id.get(),
            display_name: ctx.author().name.clone(),
            avatar_url: Some(ctx.author().face()),
        },
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Grant XP to a member.
///
/// **Command syntax:** `!givexp @member 100 helped with the event`
#[poise::command(
    prefix_command,
    guild_only,
    aliases("grant"),
    check = "in_admin_channel",
    check = "holds_admin_role"
)]
pub async fn givexp(
    ctx: Context<'_>,
    #[description = "Member to give XP to"] member: serenity::Member,
    #[description = "Amount of XP (negative takes XP away)"] amount: i64,
    #[description = "Why the XP was awarded"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    let gateway = SerenityGateway::from_context(ctx.serenity_context());
    let reason = reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let reply = ctx
        .data()
        .xp
        .grant_command(&gateway, guild_id, &member_ref(&member), amount, reason)
        .await?;
    ctx.say(reply).await?;

    Ok(())
}

/// Take XP away from a member, found by display name.
///
/// Unlike `givexp`, a missing admin role gets a visible reply.
///
/// **Command syntax:** `!removexp Some Display Name 50`
#[poise::command(
    prefix_command,
    guild_only,
    aliases("revoke"),
    check = "in_admin_channel"
)]
pub async fn removexp(
    ctx: Context<'_>,
    #[description = "Display name followed by the amount"]
    #[rest]
    args: Option<String>,
) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    let gateway = SerenityGateway::from_context(ctx.serenity_context());

    let reply = ctx
        .data()
        .xp
        .revoke_command(
            &gateway,
            guild_id,
            ctx.author().id.get(),
            args.as_deref().unwrap_or_default(),
            ctx.prefix(),
        )
        .await?;
    ctx.say(reply).await?;

    Ok(())
}

/// Show how much XP a member has.
///
/// **Command syntax:** `!xp` or `!xp @member`
#[poise::command(prefix_command, guild_only, aliases("query"), check = "in_query_channel")]
pub async fn xp(
    ctx: Context<'_>,
    #[description = "Member to check (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    let target = match member {
        Some(member) => member_ref(&member),
        None => invoker_ref(ctx).await,
    };
    let total = ctx.data().xp.xp_for(target.user_id).await?;
    ctx.say(notices::query_reply(&target, total)).await?;

    Ok(())
}

/// Show the top ten XP holders.
#[poise::command(prefix_command, guild_only, check = "in_leaderboard_channel")]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_of(ctx)?;
    let gateway = SerenityGateway::from_context(ctx.serenity_context());

    let board = ctx.data().xp.leaderboard(&gateway, guild_id).await?;
    if board.ledger_size == 0 {
        ctx.say(notices::EMPTY_LEADERBOARD).await?;
        return Ok(());
    }

    ctx.say(notices::leaderboard_text(&board.rows)).await?;
    Ok(())
}

/// Every command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![givexp(), removexp(), xp(), leaderboard()]
}

/// Usage line shown when a command's arguments can't be parsed.
pub fn usage(command: &str, prefix: &str) -> Option<String> {
    let args = match command {
        "givexp" => "@member amount [reason]",
        "removexp" => "DisplayName amount",
        "xp" => "[@member]",
        "leaderboard" => "",
        _ => return None,
    };
    let line = format!("{prefix}{command} {args}");
    Some(format!("Usage: `{}`", line.trim_end()))
}
