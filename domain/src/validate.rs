//! Input validation helpers. Keep logic minimal and deterministic.
//!
//! Messages follow the wording clients of the service already match on,
//! e.g. ``Path `description` is required.``.

use chrono::{DateTime, NaiveDate};

use crate::{CoreError, Exercise, NewExercise, UserId, Username};

pub(crate) fn required_message(path: &str) -> String {
    format!("Path `{}` is required.", path)
}

fn cast_message(kind: &str, value: &str, path: &str) -> String {
    format!("Cast to {} failed for value \"{}\" at path \"{}\"", kind, value, path)
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Validate a username for creation.
pub fn validate_username(value: Option<&str>) -> Result<Username, CoreError> {
    Username::new(value.unwrap_or_default())
}

/// Validate a required text field.
pub fn validate_required_text(value: Option<&str>, path: &str) -> Result<String, CoreError> {
    present(value)
        .map(str::to_string)
        .ok_or_else(|| CoreError::Invalid(required_message(path)))
}

/// Validate a duration. Must be present and a finite number.
pub fn validate_duration(value: Option<&str>) -> Result<f64, CoreError> {
    let raw = present(value).ok_or_else(|| CoreError::Invalid(required_message("duration")))?;
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(CoreError::Invalid(cast_message("Number", raw, "duration"))),
    }
}

/// Validate an optional exercise date, falling back to `today` when absent.
pub fn validate_exercise_date(value: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    match present(value) {
        None => Ok(today),
        Some(raw) => {
            parse_date(raw).ok_or_else(|| CoreError::Invalid(cast_message("Date", raw, "date")))
        }
    }
}

/// Validate every field of an append request. Fields are checked in order
/// `userId`, `description`, `duration`, `date`; the first failure wins.
pub fn validate_new_exercise(
    input: &NewExercise,
    today: NaiveDate,
) -> Result<(UserId, Exercise), CoreError> {
    let user_id = UserId::new(input.user_id.clone().unwrap_or_default())?;
    let description = validate_required_text(input.description.as_deref(), "description")?;
    let duration = validate_duration(input.duration.as_deref())?;
    let date = validate_exercise_date(input.date.as_deref(), today)?;
    Ok((
        user_id,
        Exercise {
            description,
            duration,
            date,
        },
    ))
}
