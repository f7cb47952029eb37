// This is the entry point of the XP tier bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON ledger, keep-alive HTTP)
// - `discord/` = Discord-specific adapters (commands, events, serenity gateway)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers
// 5. Shut everything down cleanly on ctrl-c

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::community::ChannelBindings;
use crate::core::leveling::{default_tiers, RolePolicy, XpService};
use crate::discord::commands::{leveling, presence};
use crate::discord::gateway::SerenityGateway;
use crate::discord::{daily_leaderboard, events as member_events, Data, Error};
use crate::infra::keepalive;
use crate::infra::leveling::JsonLedgerStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::GuildMemberAddition { new_member } = event {
        if let Err(e) = member_events::handle_member_join(ctx, data, new_member).await {
            tracing::error!(
                guild_id = new_member.guild_id.get(),
                user_id = new_member.user.id.get(),
                "Error greeting new member: {}",
                e
            );
        }
    }

    Ok(())
}

/// Framework error hook.
///
/// Failed checks stay silent, bad arguments get a usage line, and command
/// failures are logged. Everything else falls through to poise's default.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(e) = error {
                tracing::warn!(command = %ctx.command().name, "Command check errored: {}", e);
            }
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            let mut reply = format!("❌ {}", error);
            if let Some(usage) = leveling::usage(&ctx.command().name, ctx.prefix()) {
                reply.push('\n');
                reply.push_str(&usage);
            }
            if let Err(e) = ctx.say(reply).await {
                tracing::warn!("Failed to send usage reply: {}", e);
            }
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(command = %ctx.command().name, "Command failed: {}", error);
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::from_env().context("Failed to load configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let policy = RolePolicy::new(default_tiers()).context("Invalid tier table")?;
    let ledger = JsonLedgerStore::open(&config.ledger_path);
    let xp_service = Arc::new(XpService::new(ledger, policy, ChannelBindings::default()));

    let shutdown = CancellationToken::new();

    // Keep-alive endpoint for uptime monitors
    let keepalive_task = tokio::spawn({
        let shutdown = shutdown.clone();
        let addr = config.keepalive_addr;
        async move {
            if let Err(e) = keepalive::serve(addr, shutdown).await {
                tracing::error!(%addr, "Keep-alive endpoint failed: {}", e);
            }
        }
    });

    // Create the data structure that will be shared across all commands
    let data = Data {
        xp: Arc::clone(&xp_service),
        schedule: config.schedule,
        shutdown: shutdown.clone(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read prefix commands
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS; // Required for join events and member lists

    let prefix = config.command_prefix.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: leveling::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            // Event handler for member joins
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Bot connected as {}", ready.user.name);
                presence::on_ready(ctx, &prefix);

                // Daily leaderboard post into every guild
                daily_leaderboard::spawn(
                    SerenityGateway::from_context(ctx),
                    Arc::clone(&data.xp),
                    data.schedule,
                    data.shutdown.clone(),
                );

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;
    let shard_manager = client.shard_manager.clone();

    let outcome = tokio::select! {
        result = client.start() => result.context("Error running bot"),
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            signal.context("Failed to listen for ctrl-c")
        }
    };

    shutdown.cancel();
    shard_manager.shutdown_all().await;
    if let Err(e) = keepalive_task.await {
        tracing::warn!("Keep-alive task ended abnormally: {}", e);
    }
    tracing::info!("Bot stopped");

    outcome
}
