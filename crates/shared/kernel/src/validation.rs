//! Input checks shared by the feature slices. Failures are [`ApiError::Validation`] (422).

use crate::server::ApiError;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Trims `value` and checks its character count lies in `min..=max`.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<String, ApiError> {
    let trimmed = value.trim();
    let count = trimmed.chars().count();
    if count < min || count > max {
        return Err(ApiError::validation(format!(
            "{field} must be between {min} and {max} characters."
        )));
    }
    Ok(trimmed.to_owned())
}

/// Trims `value` and rejects it when empty.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required.")));
    }
    Ok(trimmed.to_owned())
}

pub fn email(value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    let valid = EMAIL.as_ref().is_some_and(|re| re.is_match(trimmed));
    if !valid {
        return Err(ApiError::validation("Invalid email address."));
    }
    Ok(trimmed.to_owned())
}

pub fn range<T>(field: &str, value: T, min: T, max: T) -> Result<T, ApiError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ApiError::validation(format!("{field} must be between {min} and {max}.")));
    }
    Ok(value)
}

/// Non-negative, finite amount (prices, payments).
pub fn amount(field: &str, value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(format!("{field} must be a non-negative number.")));
    }
    Ok(value)
}

/// Parses `HH:MM` (24 hour clock).
pub fn clock_time(field: &str, value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ApiError::validation(format!("{field} must use the HH:MM format.")))
}

/// Parses `YYYY-MM-DD`.
pub fn date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} must use the YYYY-MM-DD format.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_trimmed_characters() {
        assert_eq!(length("Full name", "  Asha  ", 3, 50).ok().as_deref(), Some("Asha"));
        assert!(length("Full name", " Al ", 3, 50).is_err());
        assert!(length("PIN code", "12345678901", 6, 10).is_err());
    }

    #[test]
    fn emails() {
        assert_eq!(email(" asha@example.com ").ok().as_deref(), Some("asha@example.com"));
        for bad in ["", "asha", "asha@", "@example.com", "a b@example.com", "asha@example"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn numbers() {
        assert!(range("Floor level", 5, 1, 5).is_ok());
        assert!(range("Floor level", 6, 1, 5).is_err());
        assert!(amount("Price", -0.5).is_err());
        assert!(amount("Price", f64::NAN).is_err());
        assert_eq!(amount("Price", 0.0).ok(), Some(0.0));
    }

    #[test]
    fn clock_and_calendar() {
        assert_eq!(
            clock_time("Open time", "08:30").ok(),
            NaiveTime::from_hms_opt(8, 30, 0)
        );
        assert!(clock_time("Open time", "8.30").is_err());
        assert!(clock_time("Open time", "24:00").is_err());
        assert!(date("Date of birth", "1990-02-30").is_err());
        assert!(date("Date of birth", "1990-02-28").is_ok());
    }
}
