// Guild member events.

use crate::core::community::greet_member;
use crate::discord::gateway::{member_ref, SerenityGateway};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Post the welcome card for a member who just joined.
pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    new_member: &serenity::Member,
) -> Result<(), Error> {
    let gateway = SerenityGateway::from_context(ctx);
    greet_member(
        &gateway,
        data.xp.bindings(),
        new_member.guild_id.get(),
        &member_ref(new_member),
    )
    .await?;
    Ok(())
}
