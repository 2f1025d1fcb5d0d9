//! Field validation shared by the client forms and the server store.

use chrono::NaiveDate;

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A rejected field value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A mandatory field is empty or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// The password is shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A date field could not be parsed.
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A project must start with at least one participant.
    #[error("a project needs at least one participant")]
    NoParticipants,

    /// A participant row has no user selected.
    #[error("participant #{0} has no user selected")]
    ParticipantWithoutUser(usize),
}

/// Rejects empty or whitespace-only values.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] naming `field`.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Checks a password against the minimum length.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] for a blank password and
/// [`ValidationError::PasswordTooShort`] below [`MIN_PASSWORD_LENGTH`].
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    require("password", password)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Parses an optional `YYYY-MM-DD` date; blank input means "no date".
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] if the input is not blank and
/// does not parse.
pub fn parse_optional_date(input: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}
