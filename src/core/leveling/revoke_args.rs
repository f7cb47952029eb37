// Parsing for the free-text revoke command: `<display name...> <amount>`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeArgs {
    pub display_name: String,
    pub amount: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevokeArgsError {
    #[error("expected `<display name> <amount>`")]
    MissingAmount,

    #[error("`{0}` is not a whole number")]
    InvalidAmount(String),
}

/// Split on the last whitespace: everything before is the display name, the
/// trailing token must be an integer.
pub fn parse_revoke_args(input: &str) -> Result<RevokeArgs, RevokeArgsError> {
    let (name, amount) = input
        .trim()
        .rsplit_once(char::is_whitespace)
        .ok_or(RevokeArgsError::MissingAmount)?;

    let amount = amount
        .parse::<i64>()
        .map_err(|_| RevokeArgsError::InvalidAmount(amount.to_string()))?;

    Ok(RevokeArgs {
        display_name: name.trim().to_string(),
        amount,
    })
}

/// Case-insensitive exact comparison of display names.
pub fn display_name_matches(candidate: &str, wanted: &str) -> bool {
    candidate.to_lowercase() == wanted.to_lowercase()
}
