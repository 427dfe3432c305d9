//! # Error Types
//!
//! Domain-specific error types for tundra-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tundra-core errors (this file)                                        │
//! │  ├── CoreError        - Cart rule violations, unreadable state         │
//! │  └── ValidationError  - Checkout field failures                        │
//! │                                                                         │
//! │  tundra-store errors (separate crate)                                  │
//! │  ├── StorageError     - Key-value backend failures                     │
//! │  └── StoreError       - Config / payment / wrapped core errors         │
//! │                                                                         │
//! │  Nothing here is fatal: the store logs these and degrades to a safe   │
//! │  default (empty cart, skipped listener, unsaved-but-usable state).     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// `addItem` was called with an empty product id.
    #[error("Invalid product: missing id")]
    MissingProductId,

    /// No line item with this id is in the cart.
    #[error("Product not in cart: {0}")]
    ItemNotFound(String),

    /// A quantity that is not a finite number (NaN, infinity).
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(f64),

    /// Checkout was requested while the cart is invalid.
    ///
    /// The message is the joined list of validation errors, e.g.
    /// `"Cart is empty"`.
    #[error("{0}")]
    CheckoutRejected(String),

    /// Persisted cart JSON could not be parsed.
    #[error("Stored cart is unreadable: {0}")]
    CorruptState(#[from] serde_json::Error),

    /// An amount does not fit the integer cents the payment widget expects.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Checkout field validation errors.
///
/// `Display` output is the exact message shown next to the field, so the
/// `field` values are human labels ("Full name", "ZIP code"), not ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Value does not match the field's format.
    #[error("{message}")]
    InvalidFormat { field: String, message: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn too_short(field: impl Into<String>, min: usize) -> Self {
        ValidationError::TooShort {
            field: field.into(),
            min,
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
