use super::bindings::ChannelBindings;
use super::ports::{Card, ChannelPoster, MemberRef, OutboundMessage, PlatformError};

const WELCOME_COLOUR: u32 = 0x2ECC71;

const WELCOME_FOOTER: &str = "We're happy you're here! ❤️";

pub fn welcome_card(member: &MemberRef) -> OutboundMessage {
    OutboundMessage::Card(Card {
        title: "🎉 Welcome to the Server! 🎉".to_string(),
        description: Some(format!(
            "Welcome `{}` to our amazing community! ✨\n\nBe active, earn XP, and level up your skills! 🚀",
            member.display_name
        )),
        colour: WELCOME_COLOUR,
        thumbnail: member.avatar_url.clone(),
        footer: Some(WELCOME_FOOTER.to_string()),
        ..Card::default()
    })
}

/// Post the welcome card. Returns `false` if the guild has no announcements channel.
pub async fn greet_member<P: ChannelPoster + ?Sized>(
    poster: &P,
    bindings: &ChannelBindings,
    guild_id: u64,
    member: &MemberRef,
) -> Result<bool, PlatformError> {
    let posted = poster
        .post(guild_id, &bindings.announcements, welcome_card(member))
        .await?;
    if posted {
        tracing::info!(guild_id, user_id = member.user_id, "Welcomed new member");
    } else {
        tracing::debug!(guild_id, "No announcements channel, skipping welcome");
    }
    Ok(posted)
}
