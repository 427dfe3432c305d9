//! # Cart Store
//!
//! The single owned cart instance for a session.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Caller                  CartStore                 Side effects         │
//! │  ──────                  ─────────                 ────────────         │
//! │                                                                         │
//! │  add_item(p) ──────────► state.add_product() ──┐                       │
//! │  remove_item(id) ──────► state.remove_item() ──┤                       │
//! │  update_quantity(id,n) ► state.set_quantity() ─┤                       │
//! │  clear() ──────────────► CartState::empty() ───┤                       │
//! │                                                 ▼                       │
//! │                                  lastUpdated = now                      │
//! │                                  storage.set(key, json) ──► logged on  │
//! │                                                 │             failure   │
//! │                                                 ▼                       │
//! │                                  emit cartUpdated (if saved)            │
//! │                                  emit itemAdded / itemRemoved / ...     │
//! │                                                                         │
//! │  get_summary() / get_total() / validate() ──► read only                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed write never rolls back the mutation. The in-memory cart stays
//! authoritative for the rest of the session.

use chrono::Utc;
use tracing::{debug, error, info, warn};
use tundra_core::cart::QuantityChange;
use tundra_core::{
    CartState, CartSummary, CartValidation, CheckoutOrder, CoreResult, Money, ProductInput,
};

use crate::config::StoreConfig;
use crate::error::StorageError;
use crate::events::{CartEvent, CartEventKind, EventBus, ListenerResult, SubscriptionId};
use crate::storage::KeyValueStore;

/// Owns the cart, its storage backend and its listeners.
pub struct CartStore<S: KeyValueStore> {
    state: CartState,
    storage: S,
    events: EventBus,
    config: StoreConfig,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Restores the cart from `storage` and announces it.
    ///
    /// Listeners already registered on `events` receive `cartUpdated` and
    /// then `cartLoaded`, once each. A stored value that does not parse is
    /// discarded and the store starts empty.
    pub fn init(storage: S, config: StoreConfig, events: EventBus) -> Self {
        let state = restore(&storage, &config.storage_key);
        info!(
            storage_key = %config.storage_key,
            item_count = state.item_count,
            "Cart store initialised"
        );

        let mut store = CartStore {
            state,
            storage,
            events,
            config,
        };
        store.emit(CartEvent::CartUpdated(store.state.clone()));
        store.emit(CartEvent::CartLoaded(store.state.clone()));
        store
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of `product`. Returns `false` if the product has no id.
    pub fn add_item(&mut self, product: &ProductInput) -> bool {
        if let Err(e) = self.state.add_product(product, &self.config.item_defaults) {
            warn!(error = %e, "Rejected add to cart");
            return false;
        }

        debug!(
            product_id = %product.id,
            item_count = self.state.item_count,
            "Item added to cart"
        );
        self.commit(|cart| CartEvent::ItemAdded {
            product: product.clone(),
            cart,
        });
        true
    }

    /// Removes a line. Returns `false`, with no event, if it was not there.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        if !self.state.remove_item(product_id) {
            debug!(product_id = %product_id, "Remove ignored, item not in cart");
            return false;
        }

        debug!(product_id = %product_id, "Item removed from cart");
        let product_id = product_id.to_string();
        self.commit(|cart| CartEvent::ItemRemoved { product_id, cart });
        true
    }

    /// Sets a line's quantity to `max(1, floor(quantity))`; zero or less
    /// removes the line.
    ///
    /// Returns `false` if the product is not in the cart or `quantity` is
    /// NaN or infinite.
    pub fn update_quantity(&mut self, product_id: &str, quantity: f64) -> bool {
        if self.state.find(product_id).is_none() {
            debug!(product_id = %product_id, "Quantity update ignored, item not in cart");
            return false;
        }
        if !quantity.is_finite() {
            warn!(product_id = %product_id, quantity, "Rejected non-finite quantity");
            return false;
        }
        if quantity <= 0.0 {
            return self.remove_item(product_id);
        }

        match self.state.set_quantity(product_id, quantity) {
            Ok(QuantityChange::Set(quantity)) => {
                debug!(product_id = %product_id, quantity, "Quantity updated");
                let product_id = product_id.to_string();
                self.commit(|cart| CartEvent::QuantityUpdated {
                    product_id,
                    quantity,
                    cart,
                });
                true
            }
            Ok(QuantityChange::Removed) => {
                let product_id = product_id.to_string();
                self.commit(|cart| CartEvent::ItemRemoved { product_id, cart });
                true
            }
            Err(e) => {
                warn!(error = %e, "Quantity update failed");
                false
            }
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.state = CartState::empty();
        debug!("Cart cleared");
        self.commit(CartEvent::CartCleared);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_cart(&self) -> &CartState {
        &self.state
    }

    pub fn get_item_count(&self) -> u64 {
        self.state.item_count
    }

    /// Unrounded Σ price × quantity.
    pub fn get_total(&self) -> Money {
        self.state.total()
    }

    pub fn get_summary(&self) -> CartSummary {
        self.state.summary()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn validate(&self) -> CartValidation {
        self.state.validate()
    }

    pub fn prepare_checkout(&self) -> CoreResult<CheckoutOrder> {
        self.state.prepare_checkout()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Hands the backend back, e.g. to restore a second store from it.
    pub fn into_storage(self) -> S {
        self.storage
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn subscribe<F>(&mut self, kind: CartEventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent) -> ListenerResult + Send + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    pub fn unsubscribe(&mut self, kind: CartEventKind, id: SubscriptionId) -> bool {
        self.events.unsubscribe(kind, id)
    }

    pub fn on_cart_updated<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent) -> ListenerResult + Send + 'static,
    {
        self.events.on_cart_updated(listener)
    }

    // =========================================================================
    // Panel Visibility
    // =========================================================================
    // In-memory only: no write, no event.

    pub fn open(&mut self) {
        self.state.is_open = true;
    }

    pub fn close(&mut self) {
        self.state.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.state.is_open = !self.state.is_open;
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Persists, then emits `cartUpdated` followed by the specific event.
    ///
    /// `cartUpdated` means "written to storage", so it is skipped when the
    /// write fails. The specific event is emitted either way.
    fn commit(&mut self, specific: impl FnOnce(CartState) -> CartEvent) {
        match self.persist() {
            Ok(()) => self.emit(CartEvent::CartUpdated(self.state.clone())),
            Err(e) => error!(
                storage_key = %self.config.storage_key,
                error = %e,
                "Failed to save cart, keeping in-memory state"
            ),
        }

        let event = specific(self.state.clone());
        self.emit(event);
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        self.state.last_updated = Utc::now();
        let json = serde_json::to_string(&self.state)?;
        self.storage.set(&self.config.storage_key, &json)
    }

    fn emit(&mut self, event: CartEvent) {
        let failures = self.events.emit(&event);
        if failures > 0 {
            debug!(event = %event.kind(), failures, "Some cart listeners failed");
        }
    }
}

fn restore<S: KeyValueStore>(storage: &S, key: &str) -> CartState {
    match storage.get(key) {
        Ok(Some(json)) => CartState::restore_from_json(&json).unwrap_or_else(|e| {
            warn!(storage_key = %key, error = %e, "Discarding unreadable stored cart");
            CartState::empty()
        }),
        Ok(None) => {
            debug!(storage_key = %key, "No stored cart, starting empty");
            CartState::empty()
        }
        Err(e) => {
            error!(storage_key = %key, error = %e, "Failed to read stored cart");
            CartState::empty()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<CartEventKind>>>;

    const ALL_KINDS: [CartEventKind; 6] = [
        CartEventKind::CartUpdated,
        CartEventKind::ItemAdded,
        CartEventKind::ItemRemoved,
        CartEventKind::QuantityUpdated,
        CartEventKind::CartCleared,
        CartEventKind::CartLoaded,
    ];

    fn recording_bus() -> (EventBus, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for kind in ALL_KINDS {
            let log = Arc::clone(&log);
            bus.subscribe(kind, move |event: &CartEvent| {
                log.lock().unwrap().push(event.kind());
                Ok(())
            });
        }
        (bus, log)
    }

    fn product(id: &str, price: i64) -> ProductInput {
        ProductInput::new(id)
            .with_title(format!("Product {}", id))
            .with_price(Money::from_major_minor(price, 0))
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::init(MemoryStorage::new(), StoreConfig::default(), EventBus::new())
    }

    /// Backend whose writes always fail.
    struct ReadOnlyStorage;

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    /// Backend whose reads always fail.
    struct UnreadableStorage;

    impl KeyValueStore for UnreadableStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_init_emits_updated_then_loaded() {
        let (bus, log) = recording_bus();
        let store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);

        assert!(store.is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec![CartEventKind::CartUpdated, CartEventKind::CartLoaded]
        );
    }

    #[test]
    fn test_add_same_product_twice() {
        let mut store = store();
        assert!(store.add_item(&product("p1", 10)));
        assert!(store.add_item(&product("p1", 10)));

        let cart = store.get_cart();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(store.get_item_count(), 2);
        assert_eq!(store.get_total().to_string(), "$20.00");
    }

    #[test]
    fn test_add_without_id_is_rejected() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        log.lock().unwrap().clear();

        assert!(!store.add_item(&ProductInput::new("")));
        assert!(store.is_empty());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(store.storage().get("tundra_cart").unwrap(), None);
    }

    #[test]
    fn test_add_uses_configured_defaults() {
        let mut config = StoreConfig::default();
        config.item_defaults.title = "Mystery Item".to_string();
        let mut store = CartStore::init(MemoryStorage::new(), config, EventBus::new());

        store.add_item(&ProductInput::new("bare"));
        let item = &store.get_cart().items[0];
        assert_eq!(item.title, "Mystery Item");
        assert!(item.base_price.is_zero());
    }

    #[test]
    fn test_event_order_for_add() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        log.lock().unwrap().clear();

        store.add_item(&product("p1", 5));
        assert_eq!(
            *log.lock().unwrap(),
            vec![CartEventKind::CartUpdated, CartEventKind::ItemAdded]
        );
    }

    #[test]
    fn test_remove_twice() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        store.add_item(&product("p1", 5));
        log.lock().unwrap().clear();

        assert!(store.remove_item("p1"));
        assert!(!store.remove_item("p1"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![CartEventKind::CartUpdated, CartEventKind::ItemRemoved]
        );
    }

    #[test]
    fn test_update_quantity() {
        let mut store = store();
        store.add_item(&product("p1", 3));

        assert!(store.update_quantity("p1", 4.0));
        assert_eq!(store.get_item_count(), 4);
        assert_eq!(store.get_total(), Money::from_major_minor(12, 0));

        assert!(!store.update_quantity("missing", 2.0));
    }

    #[test]
    fn test_update_quantity_floors_fractions() {
        let mut store = store();
        store.add_item(&product("p1", 3));

        assert!(store.update_quantity("p1", 0.5));
        assert_eq!(store.get_cart().find("p1").map(|i| i.quantity), Some(1));

        assert!(store.update_quantity("p1", 2.9));
        assert_eq!(store.get_item_count(), 2);
    }

    #[test]
    fn test_update_quantity_rejects_non_finite() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        store.add_item(&product("p1", 3));
        log.lock().unwrap().clear();

        assert!(!store.update_quantity("p1", f64::NAN));
        assert!(!store.update_quantity("p1", f64::INFINITY));
        assert_eq!(store.get_item_count(), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        store.add_item(&product("p1", 3));
        store.add_item(&product("p2", 1));
        log.lock().unwrap().clear();

        assert!(store.update_quantity("p1", 0.0));
        assert!(store.get_cart().find("p1").is_none());
        assert_eq!(store.get_item_count(), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec![CartEventKind::CartUpdated, CartEventKind::ItemRemoved]
        );

        assert!(store.update_quantity("p2", -5.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_fires_once() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        store.add_item(&product("p1", 3));
        store.add_item(&product("p2", 7));
        log.lock().unwrap().clear();

        store.clear();

        assert!(store.get_cart().items.is_empty());
        assert_eq!(store.get_item_count(), 0);
        let cleared = log
            .lock()
            .unwrap()
            .iter()
            .filter(|k| **k == CartEventKind::CartCleared)
            .count();
        assert_eq!(cleared, 1);
    }

    #[test]
    fn test_corrupt_storage_falls_back_to_empty() {
        let storage = MemoryStorage::new().with_entry("tundra_cart", "{not json");
        let (bus, log) = recording_bus();
        let store = CartStore::init(storage, StoreConfig::default(), bus);

        assert!(store.is_empty());
        assert_eq!(store.get_item_count(), 0);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_read_failure_starts_empty() {
        let (bus, log) = recording_bus();
        let store = CartStore::init(UnreadableStorage, StoreConfig::default(), bus);

        assert!(store.is_empty());
        assert_eq!(store.get_item_count(), 0);
        let loaded = log
            .lock()
            .unwrap()
            .iter()
            .filter(|k| **k == CartEventKind::CartLoaded)
            .count();
        assert_eq!(loaded, 1);
    }

    #[test]
    fn test_restores_and_closes_panel() {
        let stored = r#"{
            "items": [
                {"id": "p1", "title": "Parka", "image": "/p.jpg", "basePrice": 120, "quantity": 1},
                {"id": "p2", "title": "Mitts", "image": "/m.jpg", "price": 15.5, "quantity": 2}
            ],
            "itemCount": 99,
            "isOpen": true,
            "lastUpdated": "2024-01-01T00:00:00Z"
        }"#;
        let storage = MemoryStorage::new().with_entry("tundra_cart", stored);
        let store = CartStore::init(storage, StoreConfig::default(), EventBus::new());

        assert_eq!(store.get_item_count(), 3);
        assert!(!store.is_open());
        assert_eq!(store.get_total().to_string(), "$151.00");
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut store = store();
        store.add_item(&product("p1", 10));
        store.add_item(&product("p2", 4));
        store.update_quantity("p2", 3.0);
        let before = store.get_cart().clone();

        let reloaded =
            CartStore::init(store.into_storage(), StoreConfig::default(), EventBus::new());

        assert_eq!(reloaded.get_cart().items, before.items);
        assert_eq!(reloaded.get_item_count(), before.item_count);
        assert_eq!(reloaded.get_total(), before.total());
    }

    #[test]
    fn test_listener_sees_persisted_state() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        store.subscribe(CartEventKind::ItemAdded, move |event: &CartEvent| {
            *slot.lock().unwrap() = Some(event.cart().item_count);
            Ok(())
        });

        store.add_item(&product("p1", 1));
        assert_eq!(*seen.lock().unwrap(), Some(1));

        let stored = store.storage().get("tundra_cart").unwrap().unwrap();
        assert_eq!(CartState::restore_from_json(&stored).unwrap().item_count, 1);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(ReadOnlyStorage, StoreConfig::default(), bus);
        log.lock().unwrap().clear();

        assert!(store.add_item(&product("p1", 2)));
        assert_eq!(store.get_item_count(), 1);
        // nothing was saved, so only the specific event goes out
        assert_eq!(*log.lock().unwrap(), vec![CartEventKind::ItemAdded]);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec![CartEventKind::ItemAdded, CartEventKind::CartCleared]
        );
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        let mut store = store();
        store.on_cart_updated(|_: &CartEvent| Err("badge render failed".into()));
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        store.on_cart_updated(move |_: &CartEvent| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        store.add_item(&product("p1", 1));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut store = store();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let id = store.on_cart_updated(move |_: &CartEvent| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        store.add_item(&product("p1", 1));
        assert!(store.unsubscribe(CartEventKind::CartUpdated, id));
        store.add_item(&product("p1", 1));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_panel_flags_are_not_persisted() {
        let (bus, log) = recording_bus();
        let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), bus);
        log.lock().unwrap().clear();

        store.open();
        assert!(store.is_open());
        store.toggle();
        assert!(!store.is_open());
        store.toggle();
        store.close();
        assert!(!store.is_open());

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(store.storage().get("tundra_cart").unwrap(), None);
    }

    #[test]
    fn test_prepare_checkout() {
        let mut store = store();
        assert!(store.prepare_checkout().is_err());
        assert!(!store.validate().is_valid);

        store.add_item(&product("p1", 10));
        store.add_item(&product("p1", 10));
        let order = store.prepare_checkout().unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].subtotal, Money::from_major_minor(20, 0));
        assert_eq!(order.subtotal, store.get_summary().total);
    }

    proptest! {
        #[test]
        fn prop_item_count_matches_adds(n in 1usize..40) {
            let mut store = store();
            for _ in 0..n {
                store.add_item(&product("p1", 2));
            }
            prop_assert_eq!(store.get_item_count(), n as u64);
            prop_assert_eq!(store.get_cart().items.len(), 1);
        }
    }
}
