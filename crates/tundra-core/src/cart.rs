//! # Cart Operations
//!
//! Pure state transitions on [`CartState`]. Persistence and notification
//! happen one layer up, in `tundra-store`; everything here is synchronous
//! and side-effect free apart from the `tracing` warnings.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Store call              This module               State change         │
//! │  ──────────              ───────────               ────────────         │
//! │                                                                         │
//! │  add_item() ───────────► add_product() ──────────► qty += 1 or push     │
//! │                                                                         │
//! │  update_quantity() ────► set_quantity() ─────────► qty = n (or remove)  │
//! │                                                                         │
//! │  remove_item() ────────► remove_item() ──────────► items.retain(...)    │
//! │                                                                         │
//! │  (store restore) ──────► restore_from_json() ────► normalise + recount  │
//! │                                                                         │
//! │  Every mutation ends in recompute_item_count().                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    CartState, CartSummary, CartValidation, CheckoutOrder, ItemDefaults, LineItem, OrderLine,
    ProductInput, SummaryItem,
};
use crate::EMPTY_CART_MESSAGE;

/// What `set_quantity` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now holds this quantity.
    Set(u32),
    /// A quantity of zero or less removed the line.
    Removed,
}

impl CartState {
    /// A fresh, closed, empty cart stamped with the current time.
    pub fn empty() -> Self {
        CartState {
            items: Vec::new(),
            item_count: 0,
            is_open: false,
            last_updated: Utc::now(),
        }
    }

    /// Parses a persisted cart and normalises it.
    ///
    /// ## Normalisation
    /// - lines with quantity 0 are dropped
    /// - duplicate ids are merged into the first occurrence
    /// - negative prices are clamped to zero
    /// - `is_open` is forced to `false`
    /// - `item_count` is recomputed from the lines
    pub fn restore_from_json(json: &str) -> CoreResult<Self> {
        let mut state: CartState = serde_json::from_str(json)?;

        let mut merged: Vec<LineItem> = Vec::with_capacity(state.items.len());
        for mut item in state.items.drain(..) {
            if item.quantity == 0 {
                warn!(product_id = %item.id, "Dropping stored line with zero quantity");
                continue;
            }
            if item.base_price.is_negative() {
                warn!(
                    product_id = %item.id,
                    price = %item.base_price,
                    "Negative stored price clamped to zero"
                );
                item.base_price = item.base_price.non_negative();
            }
            match merged.iter_mut().find(|m| m.id == item.id) {
                Some(existing) => {
                    warn!(product_id = %item.id, "Merging duplicate stored line");
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => merged.push(item),
            }
        }

        state.items = merged;
        state.is_open = false;
        state.recompute_item_count();
        Ok(state)
    }

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Same id already in cart: quantity += 1
    /// - Otherwise: appends a new line with quantity 1, defaults applied
    ///
    /// ## Errors
    /// `CoreError::MissingProductId` when `product.id` is empty; the cart is
    /// left untouched.
    pub fn add_product(
        &mut self,
        product: &ProductInput,
        defaults: &ItemDefaults,
    ) -> CoreResult<()> {
        if product.id.is_empty() {
            return Err(CoreError::MissingProductId);
        }

        if let Some(item) = self.find_mut(&product.id) {
            item.quantity = item.quantity.saturating_add(1);
        } else {
            self.items.push(LineItem::from_product(product, defaults));
        }

        self.recompute_item_count();
        Ok(())
    }

    /// Removes the line with this id. Returns `false` if there was none.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != product_id);

        if self.items.len() == initial_len {
            return false;
        }
        self.recompute_item_count();
        true
    }

    /// Sets a line's quantity.
    ///
    /// ## Behavior
    /// - Product not in cart: `CoreError::ItemNotFound`
    /// - NaN or infinite: `CoreError::InvalidQuantity`, cart untouched
    /// - `quantity <= 0`: the line is removed
    /// - Otherwise: quantity = `max(1, floor(quantity))`, saturating at `u32::MAX`
    pub fn set_quantity(&mut self, product_id: &str, quantity: f64) -> CoreResult<QuantityChange> {
        if self.find(product_id).is_none() {
            return Err(CoreError::ItemNotFound(product_id.to_string()));
        }
        if !quantity.is_finite() {
            return Err(CoreError::InvalidQuantity(quantity));
        }

        if quantity <= 0.0 {
            self.remove_item(product_id);
            return Ok(QuantityChange::Removed);
        }

        // float-to-int `as` saturates at u32::MAX
        let clamped = quantity.floor().max(1.0) as u32;
        if let Some(item) = self.find_mut(product_id) {
            item.quantity = clamped;
        }
        self.recompute_item_count();
        Ok(QuantityChange::Set(clamped))
    }

    /// Recomputes the cached `item_count` from the lines.
    pub fn recompute_item_count(&mut self) -> u64 {
        self.item_count = self.items.iter().map(|i| u64::from(i.quantity)).sum();
        self.item_count
    }

    pub fn find(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == product_id)
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ basePrice × quantity, unrounded.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            item_count: self.item_count,
            total: self.total(),
            items: self
                .items
                .iter()
                .map(|item| SummaryItem {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    quantity: item.quantity,
                    price: item.base_price,
                    image: item.image.clone(),
                })
                .collect(),
        }
    }

    /// Non-empty is the only validity condition at this layer.
    pub fn validate(&self) -> CartValidation {
        let is_empty = self.is_empty();
        CartValidation {
            is_valid: !is_empty,
            errors: if is_empty {
                vec![EMPTY_CART_MESSAGE.to_string()]
            } else {
                Vec::new()
            },
            is_empty,
        }
    }

    /// Packages the cart for the checkout panel.
    ///
    /// ## Errors
    /// `CoreError::CheckoutRejected` carrying the joined validation errors.
    pub fn prepare_checkout(&self) -> CoreResult<CheckoutOrder> {
        let validation = self.validate();
        if !validation.is_valid {
            return Err(CoreError::CheckoutRejected(validation.errors.join(", ")));
        }

        Ok(CheckoutOrder {
            cart: self.clone(),
            subtotal: self.total(),
            items: self
                .items
                .iter()
                .map(|item| OrderLine {
                    name: item.title.clone(),
                    quantity: item.quantity,
                    price: item.base_price,
                    subtotal: item.line_total(),
                })
                .collect(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(id: &str, cents: i64) -> ProductInput {
        ProductInput::new(id)
            .with_title(format!("Product {}", id))
            .with_price(Money::from_cents(cents))
    }

    fn defaults() -> ItemDefaults {
        ItemDefaults::default()
    }

    #[test]
    fn test_add_same_product_twice() {
        let mut cart = CartState::empty();
        let p1 = product("p1", 1000);

        cart.add_product(&p1, &defaults()).unwrap();
        cart.add_product(&p1, &defaults()).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.total(), Money::from_cents(2000));
    }

    #[test]
    fn test_add_rejects_empty_id() {
        let mut cart = CartState::empty();
        let err = cart.add_product(&product("", 100), &defaults()).unwrap_err();

        assert!(matches!(err, CoreError::MissingProductId));
        assert!(cart.is_empty());

        // only an empty id is rejected
        cart.add_product(&product(" ", 100), &defaults()).unwrap();
        assert_eq!(cart.item_count, 1);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut cart = CartState::empty();
        for id in ["b", "a", "c", "a"] {
            cart.add_product(&product(id, 100), &defaults()).unwrap();
        }
        let ids: Vec<&str> = cart.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_twice() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 100), &defaults()).unwrap();

        assert!(cart.remove_item("p1"));
        assert!(!cart.remove_item("p1"));
        assert_eq!(cart.item_count, 0);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 250), &defaults()).unwrap();

        assert_eq!(cart.set_quantity("p1", 4.0).unwrap(), QuantityChange::Set(4));
        assert_eq!(cart.item_count, 4);
        assert_eq!(cart.total(), Money::from_cents(1000));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 250), &defaults()).unwrap();
        cart.add_product(&product("p2", 100), &defaults()).unwrap();

        assert_eq!(cart.set_quantity("p1", 0.0).unwrap(), QuantityChange::Removed);
        assert_eq!(cart.set_quantity("p2", -3.0).unwrap(), QuantityChange::Removed);
        assert!(cart.is_empty());
        assert_eq!(cart.item_count, 0);
    }

    #[test]
    fn test_set_quantity_floors_fractions() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 100), &defaults()).unwrap();

        assert_eq!(cart.set_quantity("p1", 0.5).unwrap(), QuantityChange::Set(1));
        assert_eq!(cart.find("p1").map(|i| i.quantity), Some(1));

        assert_eq!(cart.set_quantity("p1", 2.9).unwrap(), QuantityChange::Set(2));
        assert_eq!(cart.item_count, 2);

        assert_eq!(
            cart.set_quantity("p1", 1e12).unwrap(),
            QuantityChange::Set(u32::MAX)
        );
    }

    #[test]
    fn test_set_quantity_rejects_non_finite() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 100), &defaults()).unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                cart.set_quantity("p1", bad),
                Err(CoreError::InvalidQuantity(_))
            ));
        }
        assert_eq!(cart.item_count, 1);
    }

    #[test]
    fn test_set_quantity_unknown_item() {
        let mut cart = CartState::empty();
        let err = cart.set_quantity("nope", 3.0).unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_validate_and_prepare_checkout() {
        let mut cart = CartState::empty();
        let validation = cart.validate();
        assert!(!validation.is_valid);
        assert!(validation.is_empty);
        assert_eq!(validation.errors, vec!["Cart is empty".to_string()]);

        let err = cart.prepare_checkout().unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");

        cart.add_product(&product("p1", 1999), &defaults()).unwrap();
        cart.set_quantity("p1", 3.0).unwrap();
        let order = cart.prepare_checkout().unwrap();

        assert_eq!(order.subtotal, Money::from_cents(5997));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].name, "Product p1");
        assert_eq!(order.items[0].price, Money::from_cents(1999));
        assert_eq!(order.items[0].subtotal, Money::from_cents(5997));
    }

    #[test]
    fn test_summary() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 500), &defaults()).unwrap();
        cart.add_product(&product("p2", 250), &defaults()).unwrap();
        cart.add_product(&product("p2", 250), &defaults()).unwrap();

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total, Money::from_cents(1000));
        assert_eq!(summary.items[1].quantity, 2);
        assert_eq!(summary.items[1].price, Money::from_cents(250));
    }

    #[test]
    fn test_restore_round_trip() {
        let mut cart = CartState::empty();
        cart.add_product(&product("p1", 1099), &defaults()).unwrap();
        cart.add_product(&product("p2", 300), &defaults()).unwrap();
        cart.set_quantity("p2", 5.0).unwrap();
        cart.is_open = true;

        let json = serde_json::to_string(&cart).unwrap();
        let restored = CartState::restore_from_json(&json).unwrap();

        assert_eq!(restored.items, cart.items);
        assert_eq!(restored.item_count, cart.item_count);
        assert_eq!(restored.total(), cart.total());
        assert!(!restored.is_open);
    }

    #[test]
    fn test_restore_normalises_stored_lines() {
        let json = r#"{
            "items": [
                {"id": "a", "title": "A", "basePrice": 2, "quantity": 1},
                {"id": "b", "title": "B", "basePrice": 3, "quantity": 0},
                {"id": "a", "title": "A", "basePrice": 2, "quantity": 2}
            ],
            "itemCount": 99,
            "isOpen": true,
            "lastUpdated": "2024-05-01T12:00:00.000Z"
        }"#;

        let state = CartState::restore_from_json(json).unwrap();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].quantity, 3);
        assert_eq!(state.item_count, 3);
        assert!(!state.is_open);
    }

    #[test]
    fn test_restore_clamps_negative_price() {
        let json = r#"{"items": [{"id": "a", "basePrice": -4.5, "quantity": 2}]}"#;

        let state = CartState::restore_from_json(json).unwrap();
        assert!(state.items[0].base_price.is_zero());
        assert_eq!(state.total(), Money::zero());
    }

    #[test]
    fn test_restore_missing_fields_defaults() {
        let state = CartState::restore_from_json("{}").unwrap();
        assert!(state.is_empty());
        assert_eq!(state.item_count, 0);
    }

    #[test]
    fn test_restore_corrupt_json() {
        assert!(matches!(
            CartState::restore_from_json("{\"items\": [oops"),
            Err(CoreError::CorruptState(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_repeated_adds_accumulate(n in 1usize..200) {
            let mut cart = CartState::empty();
            let p = product("same", 100);
            for _ in 0..n {
                cart.add_product(&p, &defaults()).unwrap();
            }
            prop_assert_eq!(cart.items.len(), 1);
            prop_assert_eq!(cart.item_count, n as u64);
        }

        #[test]
        fn prop_total_is_sum_of_lines(
            lines in proptest::collection::vec((0i64..100_000, 1i64..50), 0..20)
        ) {
            let mut cart = CartState::empty();
            let mut expected = Money::zero();
            for (idx, (cents, qty)) in lines.iter().enumerate() {
                let id = format!("p{}", idx);
                cart.add_product(&product(&id, *cents), &defaults()).unwrap();
                cart.set_quantity(&id, *qty as f64).unwrap();
                expected += Money::from_cents(*cents) * (*qty as u32);
            }
            prop_assert_eq!(cart.total(), expected);
            prop_assert_eq!(
                cart.item_count,
                lines.iter().map(|(_, q)| *q as u64).sum::<u64>()
            );
        }
    }
}
