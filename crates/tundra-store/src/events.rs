//! # Cart Events
//!
//! Typed publish/subscribe for cart changes.
//!
//! ## Delivery Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        EventBus::emit(event)                            │
//! │                                                                         │
//! │  listeners[kind] = [L1, L2, L3]   (registration order)                 │
//! │                                                                         │
//! │  L1(event) ──► Ok                                                      │
//! │  L2(event) ──► Err / panic ──► logged, delivery continues             │
//! │  L3(event) ──► Ok                                                      │
//! │                                                                         │
//! │  • Synchronous: emit returns after every listener ran                  │
//! │  • Subscribing never replaces earlier listeners                        │
//! │  • The store emits only after the cart was written to storage          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, trace};
use tundra_core::{CartState, ProductInput};

/// Error a listener may hand back; it is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// What every listener returns.
pub type ListenerResult = Result<(), ListenerError>;

type Listener = Box<dyn FnMut(&CartEvent) -> ListenerResult + Send>;

// =============================================================================
// Event Kinds & Payloads
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartEventKind {
    /// Any change to the cart, including the initial load.
    CartUpdated,
    ItemAdded,
    ItemRemoved,
    QuantityUpdated,
    CartCleared,
    /// Fired once, when the store is initialised.
    CartLoaded,
}

impl CartEventKind {
    /// Event name as the storefront script knows it.
    pub fn name(&self) -> &'static str {
        match self {
            CartEventKind::CartUpdated => "cartUpdated",
            CartEventKind::ItemAdded => "itemAdded",
            CartEventKind::ItemRemoved => "itemRemoved",
            CartEventKind::QuantityUpdated => "quantityUpdated",
            CartEventKind::CartCleared => "cartCleared",
            CartEventKind::CartLoaded => "cartLoaded",
        }
    }
}

impl fmt::Display for CartEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cart change with its payload. Every variant carries the fresh snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    CartUpdated(CartState),
    ItemAdded {
        product: ProductInput,
        cart: CartState,
    },
    ItemRemoved {
        product_id: String,
        cart: CartState,
    },
    QuantityUpdated {
        product_id: String,
        quantity: u32,
        cart: CartState,
    },
    CartCleared(CartState),
    CartLoaded(CartState),
}

impl CartEvent {
    pub fn kind(&self) -> CartEventKind {
        match self {
            CartEvent::CartUpdated(_) => CartEventKind::CartUpdated,
            CartEvent::ItemAdded { .. } => CartEventKind::ItemAdded,
            CartEvent::ItemRemoved { .. } => CartEventKind::ItemRemoved,
            CartEvent::QuantityUpdated { .. } => CartEventKind::QuantityUpdated,
            CartEvent::CartCleared(_) => CartEventKind::CartCleared,
            CartEvent::CartLoaded(_) => CartEventKind::CartLoaded,
        }
    }

    /// The cart snapshot taken right after the change.
    pub fn cart(&self) -> &CartState {
        match self {
            CartEvent::CartUpdated(cart)
            | CartEvent::CartCleared(cart)
            | CartEvent::CartLoaded(cart) => cart,
            CartEvent::ItemAdded { cart, .. }
            | CartEvent::ItemRemoved { cart, .. }
            | CartEvent::QuantityUpdated { cart, .. } => cart,
        }
    }
}

// =============================================================================
// Event Bus
// =============================================================================

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Multi-subscriber, per-kind listener registry.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<CartEventKind, Vec<(SubscriptionId, Listener)>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(kind, list)| (kind.name(), list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `kind`, after any existing listeners.
    pub fn subscribe<F>(&mut self, kind: CartEventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent) -> ListenerResult + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        trace!(event = %kind, ?id, "Listener subscribed");
        id
    }

    /// Shorthand for `subscribe(CartEventKind::CartUpdated, ..)`.
    pub fn on_cart_updated<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent) -> ListenerResult + Send + 'static,
    {
        self.subscribe(CartEventKind::CartUpdated, listener)
    }

    /// Removes a listener. Returns `false` if it was not registered for `kind`.
    pub fn unsubscribe(&mut self, kind: CartEventKind, id: SubscriptionId) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        list.len() != before
    }

    pub fn listener_count(&self, kind: CartEventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every listener of its kind, in registration order.
    ///
    /// Returns how many listeners failed.
    pub fn emit(&mut self, event: &CartEvent) -> usize {
        let kind = event.kind();
        let Some(list) = self.listeners.get_mut(&kind) else {
            return 0;
        };

        let mut failures = 0;
        for (id, listener) in list.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    error!(event = %kind, ?id, error = %err, "Error in cart event listener");
                }
                Err(_) => {
                    failures += 1;
                    error!(event = %kind, ?id, "Cart event listener panicked");
                }
            }
        }
        failures
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
