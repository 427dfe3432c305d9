//! # Store Error Types
//!
//! Error types for persistence, configuration and the payment handoff.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  io::Error / serde_json::Error                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageError (this module) ← backend failure with key context         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CartStore logs it and keeps the in-memory cart authoritative          │
//! │                                                                         │
//! │  PaymentError ──► CheckoutSession ──► "Payment Failed" notice          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tundra_core::CoreError;

/// Key-value backend errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The cart could not be turned into JSON.
    #[error("Failed to serialize cart: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refuses writes (quota exceeded, private mode, ...).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.into(),
            source,
        }
    }
}

/// Errors reported by the external payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The card was declined or tokenization failed.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The widget could not reach the payment endpoint.
    #[error("Payment service unreachable: {0}")]
    Unreachable(String),
}

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading the config file failed.
    #[error("Failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The config file is not valid TOML.
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The loaded configuration breaks a rule.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
