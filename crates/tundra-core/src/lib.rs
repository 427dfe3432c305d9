//! # tundra-core: Pure Cart Logic for Tundra Cart
//!
//! This crate holds the cart state machine and the checkout math as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tundra Cart Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Presentation Layer (storefront page)             │   │
//! │  │   Sidebar ──► Quantity +/- ──► Checkout form ──► Pay button     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ snapshots / user actions               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tundra-store (CartStore, events, storage)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tundra-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────────┐   │   │
//! │  │   │  money   │ │   cart   │ │   tax    │ │   validation    │   │   │
//! │  │   │  Money   │ │ CartState│ │ estimate │ │ name/email/zip  │   │   │
//! │  │   │ TaxRate  │ │ LineItem │ │ amounts  │ │ sanitisers      │   │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └─────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO EVENT DELIVERY • PURE FUNCTIONS     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Data shapes (ProductInput, LineItem, CartState, summaries)
//! - [`money`] - Decimal money and tax rates
//! - [`cart`] - Pure cart operations on `CartState`
//! - [`tax`] - Regional tax estimator and checkout amounts
//! - [`validation`] - Checkout form field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tundra_core::{CartState, ItemDefaults, Money, ProductInput};
//! use tundra_core::tax::estimate_tax;
//!
//! let mut cart = CartState::empty();
//! let product = ProductInput::new("p1").with_price(Money::from_cents(1000));
//! cart.add_product(&product, &ItemDefaults::default()).unwrap();
//! cart.add_product(&product, &ItemDefaults::default()).unwrap();
//!
//! assert_eq!(cart.item_count, 2);
//! assert_eq!(cart.total(), Money::from_cents(2000));
//! assert_eq!(estimate_tax(cart.total(), "CA"), Money::from_cents(165));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Key the cart is stored under unless configuration says otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "tundra_cart";

/// Title used when a product arrives with neither `title` nor `name`.
pub const FALLBACK_TITLE: &str = "Untitled Product";

/// Image used when a product arrives without one.
pub const FALLBACK_IMAGE: &str = "/images/placeholder.jpg";

/// The single error `validate` reports.
pub const EMPTY_CART_MESSAGE: &str = "Cart is empty";
