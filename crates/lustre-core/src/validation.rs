//! # Validation Module
//!
//! Field validators shared by gift card purchase and bulk order upload.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront form                                              │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── One function per field, same rules for forms and CSV rows         │
//! │  └── Errors carry the user-facing sentence                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Hosted tables                                                │
//! │  └── NOT NULL / UNIQUE / CHECK constraints                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lustre_core::validation::{validate_email, validate_phone};
//!
//! assert!(validate_email("asha@example.com").is_ok());
//! assert!(validate_phone("+91 98765-43210").is_ok());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DesignTheme;
use crate::{GIFT_CARD_AMOUNT_STEP, MAX_GIFT_MESSAGE_CHARS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Fewest digits a phone number may have.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Shortest accepted recipient name, after trimming.
pub const MIN_NAME_CHARS: usize = 2;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

// Optional leading '+', then at least 10 digits / spaces / hyphens / parens.
// The digit count is checked separately.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").expect("phone pattern is valid"));

// =============================================================================
// String Validators
// =============================================================================

/// Validates a recipient name.
///
/// ## Rules
/// - Must not be empty
/// - At least [`MIN_NAME_CHARS`] characters after trimming
///
/// ## Returns
/// The trimmed name.
pub fn validate_recipient_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "Recipient name".to_string(),
        });
    }

    if name.chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError::TooShort {
            field: "Recipient name".to_string(),
            min: MIN_NAME_CHARS,
        });
    }

    Ok(name.to_string())
}

/// Validates an email address against the `local@domain.tld` shape.
///
/// ```rust
/// use lustre_core::validation::validate_email;
///
/// assert!(validate_email("meera@lustre.in").is_ok());
/// assert!(validate_email("meera@lustre").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "Recipient email".to_string(),
        });
    }

    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: "Recipient email".to_string(),
            reason: "expected name@domain.tld".to_string(),
        });
    }

    Ok(email.to_string())
}

/// Validates a phone number.
///
/// ## Rules
/// - Optional leading `+`
/// - Then only digits, spaces, hyphens and parentheses
/// - At least 10 digits
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "Recipient phone".to_string(),
        });
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !PHONE_RE.is_match(phone) || digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::InvalidFormat {
            field: "Recipient phone".to_string(),
            reason: "expected at least 10 digits".to_string(),
        });
    }

    Ok(phone.to_string())
}

/// Validates an optional gift message.
///
/// Blank messages become `None`.
pub fn validate_message(field: &str, message: &str) -> ValidationResult<Option<String>> {
    let message = message.trim();

    if message.is_empty() {
        return Ok(None);
    }

    if message.chars().count() > MAX_GIFT_MESSAGE_CHARS {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_GIFT_MESSAGE_CHARS,
        });
    }

    Ok(Some(message.to_string()))
}

/// Validates a design theme identifier.
pub fn validate_design_theme(theme: &str) -> ValidationResult<DesignTheme> {
    if theme.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "Design theme".to_string(),
        });
    }

    theme.parse()
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a rupee amount typed by a person (`"5000"`, `" 2500.00 "`).
pub fn parse_amount(raw: &str) -> ValidationResult<Money> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: "Amount".to_string(),
        });
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Money::from_major(value)),
        _ => Err(ValidationError::NotANumber {
            field: "Amount".to_string(),
        }),
    }
}

/// Validates a gift card face value.
///
/// ## Rules
/// - Between `min` and `max`, inclusive
/// - A whole multiple of [`GIFT_CARD_AMOUNT_STEP`] rupees
///
/// Both rules are checked independently, so an amount like ₹50,050 reports
/// two errors.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Amount entered: 950                                                    │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_gift_card_amount ← THIS FUNCTION                              │
/// │       │                                                                 │
/// │       ├── outside [min, max]? → "Amount must be between ₹500 and ..."   │
/// │       │                                                                 │
/// │       ├── not a multiple?     → "Amount must be a multiple of 100"      │
/// │       │                                                                 │
/// │       └── empty → OK                                                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_gift_card_amount(amount: Money, min: Money, max: Money) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if amount < min || amount > max {
        errors.push(ValidationError::OutOfRange {
            field: "Amount".to_string(),
            min,
            max,
        });
    }

    if !amount.is_multiple_of_rupees(GIFT_CARD_AMOUNT_STEP) {
        errors.push(ValidationError::NotMultipleOf {
            field: "Amount".to_string(),
            step: GIFT_CARD_AMOUNT_STEP,
        });
    }

    errors
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> (Money, Money) {
        (Money::from_major_units(500), Money::from_major_units(50_000))
    }

    #[test]
    fn test_validate_recipient_name() {
        assert_eq!(validate_recipient_name("  Asha ").unwrap(), "Asha");
        assert!(validate_recipient_name("Al").is_ok());

        assert!(matches!(
            validate_recipient_name("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_recipient_name(" A "),
            Err(ValidationError::TooShort { min: 2, .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a.b+gift@mail.example.co").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("space in@example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 (98765) 43210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765abc43210").is_err());
        assert!(validate_phone("----------").is_err());
        assert!(validate_phone("(987) 654-321").is_err());
        assert!(matches!(validate_phone(""), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_validate_message() {
        assert_eq!(validate_message("Custom message", "  ").unwrap(), None);
        assert_eq!(
            validate_message("Custom message", " Enjoy! ").unwrap(),
            Some("Enjoy!".to_string())
        );
        assert!(validate_message("Custom message", &"x".repeat(200)).is_ok());
        assert!(validate_message("Custom message", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 5000 ").unwrap(), Money::from_major_units(5000));
        assert_eq!(parse_amount("2500.50").unwrap(), Money::from_paise(250_050));
        assert!(matches!(parse_amount("five"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(parse_amount("inf"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(parse_amount(""), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_amount_950_is_in_range_but_not_a_multiple() {
        let (min, max) = bounds();
        let errors = validate_gift_card_amount(Money::from_major_units(950), min, max);
        assert_eq!(
            errors,
            vec![ValidationError::NotMultipleOf {
                field: "Amount".to_string(),
                step: 100
            }]
        );
    }

    #[test]
    fn test_amount_can_fail_both_rules() {
        let (min, max) = bounds();
        let errors = validate_gift_card_amount(Money::from_major_units(50_050), min, max);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::OutOfRange { .. }));
        assert!(matches!(errors[1], ValidationError::NotMultipleOf { .. }));
    }

    #[test]
    fn test_amount_bounds_are_inclusive() {
        let (min, max) = bounds();
        assert!(validate_gift_card_amount(min, min, max).is_empty());
        assert!(validate_gift_card_amount(max, min, max).is_empty());
        assert_eq!(
            validate_gift_card_amount(Money::from_major_units(400), min, max).len(),
            1
        );
    }
}
