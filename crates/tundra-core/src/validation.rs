//! # Validation Module
//!
//! Checkout form field validators and input sanitisers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Field Validation                          │
//! │                                                                         │
//! │  Keystroke                                                             │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  sanitize_input(field, raw)   state: uppercase letters only            │
//! │      │                        zip:   digits and '-' only               │
//! │      ▼                                                                  │
//! │  validate_field(field, value) ← THIS MODULE                            │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  FieldValidation { valid, message }                                    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Checkout session decides whether the message is shown yet             │
//! │  (silent until the first submit attempt)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tundra_core::validation::{validate_zip, CheckoutField};
//!
//! assert!(validate_zip("99501").is_ok());
//! assert_eq!(
//!     validate_zip("9950").unwrap_err().to_string(),
//!     "ZIP code must be 5 digits (or 9 with dash)"
//! );
//! assert_eq!(CheckoutField::ALL.len(), 6);
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("Invalid regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

static STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("Invalid regex"));

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("Invalid regex"));

// =============================================================================
// Fields
// =============================================================================

/// The six checkout form fields, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutField {
    Name,
    Email,
    Address,
    City,
    State,
    Zip,
}

impl CheckoutField {
    /// Form order; "first invalid field" means first in this list.
    pub const ALL: [CheckoutField; 6] = [
        CheckoutField::Name,
        CheckoutField::Email,
        CheckoutField::Address,
        CheckoutField::City,
        CheckoutField::State,
        CheckoutField::Zip,
    ];

    /// DOM id of the input on the storefront page.
    pub fn element_id(&self) -> &'static str {
        match self {
            CheckoutField::Name => "co-name",
            CheckoutField::Email => "co-email",
            CheckoutField::Address => "co-address",
            CheckoutField::City => "co-city",
            CheckoutField::State => "co-state",
            CheckoutField::Zip => "co-zip",
        }
    }
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

/// Outcome of one field check, in the shape the form renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldValidation {
    pub valid: bool,
    /// Empty when `valid`.
    pub message: String,
}

impl FieldValidation {
    pub fn ok() -> Self {
        FieldValidation {
            valid: true,
            message: String::new(),
        }
    }
}

impl From<ValidationResult<()>> for FieldValidation {
    fn from(result: ValidationResult<()>) -> Self {
        match result {
            Ok(()) => FieldValidation::ok(),
            Err(err) => FieldValidation {
                valid: false,
                message: err.to_string(),
            },
        }
    }
}

// =============================================================================
// Form
// =============================================================================

/// Raw values of the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl CheckoutForm {
    pub fn get(&self, field: CheckoutField) -> &str {
        match field {
            CheckoutField::Name => &self.name,
            CheckoutField::Email => &self.email,
            CheckoutField::Address => &self.address,
            CheckoutField::City => &self.city,
            CheckoutField::State => &self.state,
            CheckoutField::Zip => &self.zip,
        }
    }

    pub fn set(&mut self, field: CheckoutField, value: String) {
        let slot = match field {
            CheckoutField::Name => &mut self.name,
            CheckoutField::Email => &mut self.email,
            CheckoutField::Address => &mut self.address,
            CheckoutField::City => &mut self.city,
            CheckoutField::State => &mut self.state,
            CheckoutField::Zip => &mut self.zip,
        };
        *slot = value;
    }

    /// First field (in form order) that fails validation.
    pub fn first_invalid(&self) -> Option<CheckoutField> {
        CheckoutField::ALL
            .into_iter()
            .find(|field| validate_field(*field, self.get(*field)).is_err())
    }
}

// =============================================================================
// Sanitisers
// =============================================================================

/// Applies the as-you-type filter for a field.
///
/// State is uppercased with non-letters removed; zip keeps digits and `-`.
/// Other fields pass through untouched.
pub fn sanitize_input(field: CheckoutField, raw: &str) -> String {
    match field {
        CheckoutField::State => raw
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .filter(char::is_ascii_uppercase)
            .collect(),
        CheckoutField::Zip => raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '-')
            .collect(),
        _ => raw.to_string(),
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Dispatches to the validator for `field`.
pub fn validate_field(field: CheckoutField, value: &str) -> ValidationResult<()> {
    match field {
        CheckoutField::Name => validate_name(value),
        CheckoutField::Email => validate_email(value),
        CheckoutField::Address => validate_address(value),
        CheckoutField::City => validate_city(value),
        CheckoutField::State => validate_state(value),
        CheckoutField::Zip => validate_zip(value),
    }
}

/// Same as [`validate_field`], in the `{ valid, message }` form.
pub fn check_field(field: CheckoutField, value: &str) -> FieldValidation {
    validate_field(field, value).into()
}

/// Validates the shopper's full name.
///
/// ## Rules
/// - Required
/// - At least 2 characters
/// - Letters, whitespace, apostrophes and hyphens only
pub fn validate_name(value: &str) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("Full name"));
    }
    if trimmed.chars().count() < 2 {
        return Err(ValidationError::too_short("Name", 2));
    }
    if !NAME_RE.is_match(trimmed) {
        return Err(ValidationError::invalid(
            "Name",
            "Name contains invalid characters",
        ));
    }
    Ok(())
}

/// Validates an email address (`something@domain.tld`, no whitespace).
pub fn validate_email(value: &str) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("Email"));
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::invalid(
            "Email",
            "Please enter a valid email address",
        ));
    }
    Ok(())
}

pub fn validate_address(value: &str) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("Address"));
    }
    if trimmed.chars().count() < 5 {
        return Err(ValidationError::too_short("Address", 5));
    }
    Ok(())
}

pub fn validate_city(value: &str) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("City"));
    }
    if trimmed.chars().count() < 2 {
        return Err(ValidationError::too_short("City", 2));
    }
    Ok(())
}

/// Validates a two-letter state code. Case-insensitive.
pub fn validate_state(value: &str) -> ValidationResult<()> {
    let upper = value.trim().to_uppercase();
    if upper.is_empty() {
        return Err(ValidationError::required("State"));
    }
    if upper.chars().count() != 2 {
        return Err(ValidationError::invalid(
            "State",
            "State must be 2 letters (e.g., CA, NY)",
        ));
    }
    if !STATE_RE.is_match(&upper) {
        return Err(ValidationError::invalid(
            "State",
            "State must be 2 letters only",
        ));
    }
    Ok(())
}

/// Validates a US ZIP or ZIP+4 code.
pub fn validate_zip(value: &str) -> ValidationResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("ZIP code"));
    }
    if !ZIP_RE.is_match(trimmed) {
        return Err(ValidationError::invalid(
            "ZIP code",
            "ZIP code must be 5 digits (or 9 with dash)",
        ));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
