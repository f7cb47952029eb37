// User-facing text for the leveling commands and announcements.
//
// Kept in one place so the wording can be tested without a Discord connection.

use super::xp_service::RankedMember;
use crate::core::community::{Card, CardField, MemberRef, OutboundMessage};

pub const EMPTY_LEADERBOARD: &str = "No XP data available yet!";

const GOLD: u32 = 0xF1C40F;

fn reason_suffix(reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!(" 📝 {}", reason),
        None => String::new(),
    }
}

/// Reply in the admin channel after a grant.
pub fn grant_ack(member: &MemberRef, amount: i64, reason: Option<&str>) -> String {
    format!(
        "✅ {} received {} XP!{}",
        member.mention(),
        amount,
        reason_suffix(reason)
    )
}

/// Public notice in the announcements channel after a grant.
pub fn gain_announcement(member: &MemberRef, amount: i64, reason: Option<&str>) -> String {
    format!(
        "✨ {} just gained **{} XP**!{}",
        member.mention(),
        amount,
        reason_suffix(reason)
    )
}

pub fn level_up(member: &MemberRef, label: &str) -> String {
    format!(
        "🎉 `{}` just leveled up to **{}**!",
        member.display_name, label
    )
}

pub fn revoke_confirmation(member: &MemberRef, amount: i64) -> String {
    format!("✅ `{}` lost **{} XP**.", member.display_name, amount)
}

pub fn revoke_usage(prefix: &str) -> String {
    format!("❌ Invalid command format. Use `{}removexp DisplayName XP`.", prefix)
}

pub fn missing_admin_role(role: &str) -> String {
    format!("❌ You need the '{}' role to use this command.", role)
}

pub fn member_not_found(display_name: &str) -> String {
    format!(
        "❌ Could not find a member with display name '{}'.",
        display_name
    )
}

pub fn query_reply(member: &MemberRef, xp: u64) -> String {
    format!("🎯 {} has {} XP!", member.display_name, xp)
}

/// Plain-text top list for the leaderboard command.
pub fn leaderboard_text(rows: &[RankedMember]) -> String {
    let mut message = String::from("🏆 **Top 10 XP Players:**\n");
    for row in rows {
        message.push_str(&format!(
            "{}. {} — {} XP\n",
            row.rank, row.display_name, row.xp
        ));
    }
    message
}

/// Embed for the scheduled daily post.
pub fn daily_leaderboard_card(
    rows: &[RankedMember],
    footer: String,
    footer_icon: Option<String>,
) -> OutboundMessage {
    let fields = rows
        .iter()
        .map(|row| CardField {
            name: format!("{}. {}", row.rank, row.display_name),
            value: format!("XP: {}", row.xp),
            inline: false,
        })
        .collect();

    OutboundMessage::Card(Card {
        title: "🏆 Daily XP Leaderboard".to_string(),
        description: Some("Top 10 XP holders".to_string()),
        colour: GOLD,
        fields,
        footer: Some(footer),
        footer_icon,
        ..Card::default()
    })
}
