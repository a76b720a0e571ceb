//! # Validation Module
//!
//! Input validation utilities for the back office.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web app (TypeScript)                                         │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: required fields, formats, ranges                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE email constraints                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::Percentage;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text field accepted anywhere.
pub const MAX_TEXT_LEN: usize = 2000;

// =============================================================================
// String Validators
// =============================================================================

/// Fails with [`ValidationError::Required`] when `value` is blank.
pub fn require(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.len() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Lower-cases and trims an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Exactly one `@` with text on both sides
/// - Domain part contains a dot
///
/// ## Example
/// ```rust
/// use cpr_core::validation::validate_email;
///
/// assert!(validate_email("staff@cpr.com.bd").is_ok());
/// assert!(validate_email("staff").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    require("email", email)?;
    let email = email.trim();

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(d), None) => (l, d),
        _ => {
            return Err(ValidationError::invalid_format("email", "must contain a single @"));
        }
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || email.contains(char::is_whitespace) {
        return Err(ValidationError::invalid_format("email", "not a valid address"));
    }
    Ok(())
}

/// Validates a record id.
///
/// Ids are UUID v4 strings; anything else cannot exist in the store.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    Uuid::parse_str(id.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::invalid_format(field, "must be a UUID"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a percentage lies within 0-100.
pub fn validate_percentage(field: &str, pct: Percentage) -> ValidationResult<()> {
    if pct.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("name", "Rafi").is_ok());
        assert!(require("name", "   ").is_err());
        assert!(require("note", &"x".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@@b.co").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a b@c.co").is_err());
        assert_eq!(normalize_email("  Rafi@CPR.com "), "rafi@cpr.com");
    }

    #[test]
    fn test_id() {
        assert!(validate_id("id", "7f1b3a34-5c1e-4c50-9d7e-2f4d6c8b9a01").is_ok());
        assert!(validate_id("id", "65f0c2aa1b2c3d4e5f607182").is_err());
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_percentage("p", Percentage::from_percent(100)).is_ok());
        assert!(validate_percentage("p", Percentage::from_bps(10_001)).is_err());
    }
}
