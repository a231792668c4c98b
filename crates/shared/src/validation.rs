//! Common validation utilities.

use chrono::{DateTime, Duration, Utc};
use validator::ValidationError;

/// Longest maintenance window an admin may schedule.
const MAX_MAINTENANCE_WINDOW_HOURS: i64 = 72;

/// Maximum length of an email address (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$").unwrap();
}

/// Validates that an address is usable as an email recipient.
pub fn validate_email_address(address: &str) -> Result<(), ValidationError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("email_missing");
        err.message = Some("Email address is empty".into());
        return Err(err);
    }

    if trimmed.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(trimmed) {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Email address is not well formed".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a maintenance window.
/// - End must be strictly after start
/// - Window may not exceed 72 hours
pub fn validate_maintenance_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if end <= start {
        let mut err = ValidationError::new("window_order");
        err.message = Some("Maintenance window must end after it starts".into());
        return Err(err);
    }

    if end - start > Duration::hours(MAX_MAINTENANCE_WINDOW_HOURS) {
        let mut err = ValidationError::new("window_length");
        err.message = Some("Maintenance window cannot exceed 72 hours".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("site.lead@builder.example").is_ok());
        assert!(validate_email_address("o'brien+ops@example.co.uk").is_ok());
        assert!(validate_email_address("  padded@example.com ").is_ok());
    }

    #[test]
    fn test_validate_generated_addresses() {
        use fake::{faker::internet::en::SafeEmail, Fake};

        for _ in 0..50 {
            let email: String = SafeEmail().fake();
            assert!(validate_email_address(&email).is_ok(), "{}", email);
        }
    }

    #[test]
    fn test_validate_email_address_rejects_malformed() {
        assert!(validate_email_address("").is_err());
        assert!(validate_email_address("   ").is_err());
        assert!(validate_email_address("no-at-sign").is_err());
        assert!(validate_email_address("user@localhost").is_err());
        assert!(validate_email_address("two@@example.com").is_err());
    }

    #[test]
    fn test_validate_email_address_error_codes() {
        assert_eq!(validate_email_address("").unwrap_err().code, "email_missing");
        assert_eq!(
            validate_email_address("nope").unwrap_err().code,
            "email_format"
        );
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email_address(&long).unwrap_err().code, "email_format");
    }

    #[test]
    fn test_validate_maintenance_window() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        assert!(validate_maintenance_window(start, start + Duration::hours(2)).is_ok());
        assert!(validate_maintenance_window(start, start + Duration::hours(72)).is_ok());
    }

    #[test]
    fn test_validate_maintenance_window_rejects_inverted() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        let err = validate_maintenance_window(start, start).unwrap_err();
        assert_eq!(err.code, "window_order");
        assert!(validate_maintenance_window(start, start - Duration::minutes(1)).is_err());
    }

    #[test]
    fn test_validate_maintenance_window_rejects_too_long() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        let err =
            validate_maintenance_window(start, start + Duration::hours(73)).unwrap_err();
        assert_eq!(err.code, "window_length");
    }
}
