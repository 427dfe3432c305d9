//! # tundra-store: Cart Store for Tundra Cart
//!
//! Owns the live cart for a storefront session: restores it from a
//! key-value backend, writes it back after every change, announces changes
//! to subscribers, and drives the checkout handoff.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tundra Cart Data Flow                            │
//! │                                                                         │
//! │  Presentation layer (buttons, badge, drawer, checkout panel)           │
//! │       │  add_item / update_quantity / pay        ▲ CartEvent           │
//! │       ▼                                          │                      │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tundra-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   CartStore   │    │   EventBus    │    │  Checkout    │  │   │
//! │  │   │  (store.rs)   │───►│  (events.rs)  │    │  Session     │  │   │
//! │  │   │               │    │               │    │(checkout.rs) │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │           │                                         │          │   │
//! │  │           ▼                                         ▼          │   │
//! │  │   ┌───────────────┐                         PaymentWidget      │   │
//! │  │   │ KeyValueStore │                         (external)         │   │
//! │  │   │ (storage.rs)  │                                            │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ~/.local/share/tundra-cart/tundra_cart.json (FileStorage)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The cart store and its mutation pipeline
//! - [`events`] - Typed cart events and the listener registry
//! - [`storage`] - Key-value backends (memory, file)
//! - [`checkout`] - Checkout form session and payment handoff
//! - [`config`] - Configuration loading
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust
//! use tundra_core::{Money, ProductInput};
//! use tundra_store::{CartEventKind, CartStore, EventBus, MemoryStorage, StoreConfig};
//!
//! let mut events = EventBus::new();
//! events.subscribe(CartEventKind::CartLoaded, |event| {
//!     println!("cart ready with {} items", event.cart().item_count);
//!     Ok(())
//! });
//!
//! let mut store = CartStore::init(MemoryStorage::new(), StoreConfig::default(), events);
//! store.add_item(&ProductInput::new("parka").with_price(Money::from_cents(12000)));
//!
//! assert_eq!(store.get_item_count(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod events;
pub mod storage;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{
    CheckoutSession, PaymentAttempt, PaymentNotice, PaymentReceipt, PaymentRequest,
    PaymentWidget,
};
pub use config::StoreConfig;
pub use error::{PaymentError, StorageError, StoreError, StoreResult};
pub use events::{
    CartEvent, CartEventKind, EventBus, ListenerError, ListenerResult, SubscriptionId,
};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::CartStore;
