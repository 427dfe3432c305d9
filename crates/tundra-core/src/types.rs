//! # Domain Types
//!
//! Data shapes shared by the cart logic, the store and the presentation layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ProductInput   │   │    LineItem     │   │   CartState     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  id (unique)    │──►│  items          │       │
//! │  │  title? name?   │   │  title, image   │   │  itemCount      │       │
//! │  │  image? price?  │   │  basePrice      │   │  isOpen         │       │
//! │  └─────────────────┘   │  quantity ≥ 1   │   │  lastUpdated    │       │
//! │         ▲              └─────────────────┘   └────────┬────────┘       │
//! │         │ ItemDefaults applied once                   │                 │
//! │                                                        ▼                │
//! │              CartSummary · CartValidation · CheckoutOrder              │
//! │                     (read-only projections)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Layout
//! `CartState` serializes to exactly the stored JSON shape:
//! `{ "items": [...], "itemCount": 2, "isOpen": false, "lastUpdated": "..." }`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{FALLBACK_IMAGE, FALLBACK_TITLE};

// =============================================================================
// Product Input
// =============================================================================

/// A product as handed over by the page when the shopper clicks "add".
///
/// Every field except `id` is optional; gaps are filled by [`ItemDefaults`]
/// when the line item is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Alternate title some product cards send instead of `title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

impl ProductInput {
    pub fn new(id: impl Into<String>) -> Self {
        ProductInput {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    /// Title to show for this product: `title`, then `name`, if non-empty.
    pub fn display_title(&self) -> Option<&str> {
        [self.title.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

// =============================================================================
// Item Defaults
// =============================================================================

/// Fallback values applied once, when a `LineItem` is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefaults {
    pub title: String,
    pub image: String,
    pub description: String,
}

impl Default for ItemDefaults {
    fn default() -> Self {
        ItemDefaults {
            title: FALLBACK_TITLE.to_string(),
            image: FALLBACK_IMAGE.to_string(),
            description: String::new(),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

fn fallback_title() -> String {
    FALLBACK_TITLE.to_string()
}

fn fallback_image() -> String {
    FALLBACK_IMAGE.to_string()
}

/// One product line in the cart.
///
/// ## Invariants
/// - `quantity >= 1`; a line that would drop to zero is removed instead
/// - `id` is unique within a cart
/// - `base_price` is non-negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub id: String,

    #[serde(default = "fallback_title")]
    pub title: String,

    #[serde(default = "fallback_image")]
    pub image: String,

    #[serde(default)]
    pub description: String,

    /// Unit price. Older stored carts used the key `price`.
    #[serde(default, alias = "price")]
    pub base_price: Money,

    pub quantity: u32,
}

impl LineItem {
    /// Builds a fresh line (quantity 1) from page input.
    ///
    /// A negative price is clamped to zero.
    pub fn from_product(product: &ProductInput, defaults: &ItemDefaults) -> Self {
        let price = product.price.unwrap_or_default();
        if price.is_negative() {
            tracing::warn!(product_id = %product.id, %price, "Negative price clamped to zero");
        }

        LineItem {
            id: product.id.clone(),
            title: product
                .display_title()
                .map(str::to_string)
                .unwrap_or_else(|| defaults.title.clone()),
            image: product
                .image
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| defaults.image.clone()),
            description: product
                .description
                .clone()
                .unwrap_or_else(|| defaults.description.clone()),
            base_price: price.non_negative(),
            quantity: 1,
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.base_price * self.quantity
    }
}

// =============================================================================
// Cart State
// =============================================================================

/// The whole cart, exactly as persisted.
///
/// ## Invariants
/// - `item_count == Σ items[*].quantity`, recomputed after every mutation
/// - `is_open` is UI state; it is forced to `false` on restore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartState {
    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub item_count: u64,

    #[serde(default)]
    pub is_open: bool,

    #[serde(default = "Utc::now")]
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
}

impl Default for CartState {
    fn default() -> Self {
        CartState::empty()
    }
}

// =============================================================================
// Read-Only Projections
// =============================================================================

/// One row of [`CartSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SummaryItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    pub price: Money,
    pub image: String,
}

/// What the sidebar renders: lines, badge count and total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSummary {
    pub item_count: u64,
    pub total: Money,
    pub items: Vec<SummaryItem>,
}

/// Result of `validate`: a non-empty cart is the only validity condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub is_empty: bool,
}

/// One order line handed to checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    pub subtotal: Money,
}

/// A cart that passed validation and is ready for the checkout panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutOrder {
    pub cart: CartState,
    pub subtotal: Money,
    pub items: Vec<OrderLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================
