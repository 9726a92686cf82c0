//! Client-side input validation.
//!
//! Failures here never reach the network. Messages match what the backend
//! would reject so the caller can show them verbatim.

use time::{Duration, OffsetDateTime};

use crate::net::types::{BookingCreate, BookingUpdate, RoomInput};

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const TITLE_MAX_LENGTH: usize = 255;
pub const NOTES_MAX_LENGTH: usize = 1000;
pub const BOOKING_MIN_MINUTES: i64 = 15;
pub const BOOKING_MAX_HOURS: i64 = 8;

const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_owned(), message: message.into() }
    }
}

type Outcome = Result<(), ValidationError>;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// # Errors
///
/// Fails when `value` is empty or whitespace.
pub fn required(value: &str, field: &str) -> Outcome {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{field} is required")));
    }
    Ok(())
}

/// Empty values pass; pair with [`required`] when the field is mandatory.
///
/// # Errors
///
/// Fails when `value` is shorter than `min` characters.
pub fn min_length(value: &str, min: usize, field: &str) -> Outcome {
    if !value.is_empty() && value.chars().count() < min {
        return Err(ValidationError::new(field, format!("{field} must be at least {min} characters")));
    }
    Ok(())
}

/// # Errors
///
/// Fails when `value` is longer than `max` characters.
pub fn max_length(value: &str, max: usize, field: &str) -> Outcome {
    if value.chars().count() > max {
        return Err(ValidationError::new(field, format!("{field} cannot exceed {max} characters")));
    }
    Ok(())
}

/// # Errors
///
/// Fails when `value` lies outside `min..=max`.
pub fn range(value: i64, min: i64, max: i64, field: &str) -> Outcome {
    if value < min {
        return Err(ValidationError::new(field, format!("{field} must be at least {min}")));
    }
    if value > max {
        return Err(ValidationError::new(field, format!("{field} cannot exceed {max}")));
    }
    Ok(())
}

/// Shape check equivalent to `local@domain.tld` with no whitespace.
///
/// # Errors
///
/// Fails when `value` is empty or not an email address.
pub fn email(value: &str) -> Outcome {
    required(value, "Email")?;
    let invalid = || ValidationError::new("Email", "Please enter a valid email address");
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let dotted = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !dotted {
        return Err(invalid());
    }
    Ok(())
}

/// Password policy: length, lower, upper, digit, special character.
///
/// # Errors
///
/// Fails with the first rule `value` breaks.
pub fn password(value: &str) -> Outcome {
    const FIELD: &str = "Password";
    if value.is_empty() {
        return Err(ValidationError::new(FIELD, "Password is required"));
    }
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::new(
            FIELD,
            format!("Password must be at least {PASSWORD_MIN_LENGTH} characters"),
        ));
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::new(FIELD, "Must contain at least one lowercase letter"));
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(FIELD, "Must contain at least one uppercase letter"));
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(FIELD, "Must contain at least one number"));
    }
    if !value.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(ValidationError::new(FIELD, "Must contain at least one special character (@#$%)"));
    }
    Ok(())
}

/// # Errors
///
/// Fails when the confirmation is empty or differs.
pub fn password_match(password: &str, confirm: &str) -> Outcome {
    const FIELD: &str = "Confirm password";
    if confirm.is_empty() {
        return Err(ValidationError::new(FIELD, "Please confirm your password"));
    }
    if password != confirm {
        return Err(ValidationError::new(FIELD, "Passwords do not match"));
    }
    Ok(())
}

// =============================================================================
// FORMS
// =============================================================================

/// # Errors
///
/// Fails on a malformed email or an empty password.
pub fn login(email_value: &str, password_value: &str) -> Outcome {
    email(email_value)?;
    if password_value.is_empty() {
        return Err(ValidationError::new("Password", "Password is required"));
    }
    Ok(())
}

/// # Errors
///
/// Fails on a missing name, malformed email, or weak password.
pub fn registration(full_name: &str, email_value: &str, password_value: &str) -> Outcome {
    required(full_name, "Full name")?;
    max_length(full_name, 255, "Full name")?;
    email(email_value)?;
    password(password_value)
}

/// End after start, at least 15 minutes, at most 8 hours.
///
/// # Errors
///
/// Fails with the first rule the window breaks.
pub fn time_window(start: OffsetDateTime, end: OffsetDateTime) -> Outcome {
    if end <= start {
        return Err(ValidationError::new("endAt", "End time must be after start time"));
    }
    let length = end - start;
    if length < Duration::minutes(BOOKING_MIN_MINUTES) {
        return Err(ValidationError::new(
            "endAt",
            format!("Booking duration must be at least {BOOKING_MIN_MINUTES} minutes"),
        ));
    }
    if length > Duration::hours(BOOKING_MAX_HOURS) {
        return Err(ValidationError::new(
            "endAt",
            format!("Booking duration cannot exceed {BOOKING_MAX_HOURS} hours"),
        ));
    }
    Ok(())
}

/// # Errors
///
/// Fails on an empty title, overlong text, a past start, or a bad window.
pub fn booking_create(booking: &BookingCreate, now: OffsetDateTime) -> Outcome {
    booking_text(&booking.title, booking.notes.as_deref())?;
    if booking.start_at <= now {
        return Err(ValidationError::new("startAt", "Start time must be in the future"));
    }
    time_window(booking.start_at, booking.end_at)
}

/// # Errors
///
/// Fails on an empty title, overlong text, or a bad window.
pub fn booking_update(booking: &BookingUpdate) -> Outcome {
    booking_text(&booking.title, booking.notes.as_deref())?;
    time_window(booking.start_at, booking.end_at)
}

fn booking_text(title: &str, notes: Option<&str>) -> Outcome {
    required(title, "Title")?;
    max_length(title, TITLE_MAX_LENGTH, "Title")?;
    max_length(notes.unwrap_or_default(), NOTES_MAX_LENGTH, "Notes")
}

/// # Errors
///
/// Fails on an empty name or a capacity below one.
pub fn room(room: &RoomInput) -> Outcome {
    required(&room.name, "Name")?;
    max_length(&room.name, 255, "Name")?;
    range(i64::from(room.capacity), 1, i64::from(u32::MAX), "Capacity")
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
