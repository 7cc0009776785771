//! Validation helpers for DTOs.
//!
//! Lengths are counted in characters after trimming surrounding whitespace.

use std::ops::RangeInclusive;

use validator::ValidationError;

/// Accepted length of a game name.
pub const GAME_NAME_LENGTH: RangeInclusive<usize> = 2..=75;
/// Accepted length of a player name (strictly between 2 and 20).
pub const PLAYER_NAME_LENGTH: RangeInclusive<usize> = 3..=19;
/// Accepted length of a description name.
pub const DESCRIPTION_NAME_LENGTH: RangeInclusive<usize> = 2..=75;
/// Accepted length of a description text.
pub const DESCRIPTION_TEXT_LENGTH: RangeInclusive<usize> = 100..=3000;

fn validate_trimmed_length(
    value: &str,
    range: RangeInclusive<usize>,
    code: &'static str,
    label: &str,
) -> Result<(), ValidationError> {
    let length = value.trim().chars().count();
    if range.contains(&length) {
        return Ok(());
    }

    let mut err = ValidationError::new(code);
    err.message = Some(
        format!(
            "{label} must be between {} and {} characters (got {length})",
            range.start(),
            range.end()
        )
        .into(),
    );
    Err(err)
}

pub fn validate_game_name(name: &str) -> Result<(), ValidationError> {
    validate_trimmed_length(name, GAME_NAME_LENGTH, "game_name_length", "Game name")
}

/// Validates a player name; `position` is zero-based and only used in the message.
pub fn validate_player_name(name: &str, position: usize) -> Result<(), ValidationError> {
    validate_trimmed_length(
        name,
        PLAYER_NAME_LENGTH,
        "player_name_length",
        &format!("Player #{} name", position + 1),
    )
}

pub fn validate_description_name(name: &str) -> Result<(), ValidationError> {
    validate_trimmed_length(
        name,
        DESCRIPTION_NAME_LENGTH,
        "description_name_length",
        "Description name",
    )
}

pub fn validate_description_text(text: &str) -> Result<(), ValidationError> {
    validate_trimmed_length(
        text,
        DESCRIPTION_TEXT_LENGTH,
        "description_length",
        "Description",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_name_bounds() {
        assert!(validate_game_name("a").is_err());
        assert!(validate_game_name("ab").is_ok());
        assert!(validate_game_name(&"x".repeat(75)).is_ok());
        assert!(validate_game_name(&"x".repeat(76)).is_err());
    }

    #[test]
    fn test_lengths_ignore_surrounding_whitespace() {
        assert!(validate_game_name("   a   ").is_err());
        assert!(validate_description_name("  ok  ").is_ok());
    }

    #[test]
    fn test_player_name_is_strictly_between_two_and_twenty() {
        assert!(validate_player_name("Al", 0).is_err());
        assert!(validate_player_name("Ali", 0).is_ok());
        assert!(validate_player_name(&"p".repeat(19), 0).is_ok());
        assert!(validate_player_name(&"p".repeat(20), 0).is_err());
    }

    #[test]
    fn test_player_error_names_the_position() {
        let err = validate_player_name("x", 2).unwrap_err();
        let message = err.message.unwrap();
        assert!(message.contains("Player #3"), "{message}");
    }

    #[test]
    fn test_description_text_bounds() {
        assert!(validate_description_text(&"d".repeat(99)).is_err());
        assert!(validate_description_text(&"d".repeat(100)).is_ok());
        assert!(validate_description_text(&"d".repeat(3000)).is_ok());
        assert!(validate_description_text(&"d".repeat(3001)).is_err());
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        assert!(validate_description_name("éé").is_ok());
        assert!(validate_game_name("é").is_err());
    }
}
