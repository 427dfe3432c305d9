//! # Checkout Session
//!
//! State behind the inline checkout panel: the shipping form, when field
//! errors become visible, and the handoff to the external payment widget.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Session Flow                              │
//! │                                                                         │
//! │  open() ─────► submitted = false, payment_bound = false                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  edit(field, raw) ──► sanitise ──► validate ──► error hidden           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  submit() ───► submitted = true, every field validated                 │
//! │     │          first invalid field returned                            │
//! │     ▼                                                                   │
//! │  edit / blur ─► errors now shown inline                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  pay(store, widget)                                                     │
//! │     ├── form invalid ─────► InvalidForm(field), widget not called      │
//! │     ├── total <= 0 ───────► NothingToPay                               │
//! │     ├── widget Ok ────────► cart cleared, panel closed, success notice │
//! │     └── widget Err ───────► cart untouched, failure notice             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use tundra_core::tax::CheckoutAmounts;
use tundra_core::validation::{check_field, sanitize_input, CheckoutField, CheckoutForm};
use tundra_core::Money;

use crate::error::PaymentError;
use crate::storage::KeyValueStore;
use crate::store::CartStore;

// =============================================================================
// Payment Widget Boundary
// =============================================================================

/// What the widget is asked to charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount_cents: i64,
}

/// What the widget reports after a successful charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment_id: Option<String>,
}

/// The card-entry widget. Tokenization and the charge happen behind it.
pub trait PaymentWidget {
    fn charge(&mut self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}

// =============================================================================
// Notices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeAction {
    pub label: String,
    pub variant: ActionVariant,
}

impl NoticeAction {
    fn new(label: &str, variant: ActionVariant) -> Self {
        NoticeAction {
            label: label.to_string(),
            variant,
        }
    }
}

/// Modal content shown after a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    /// Empty when there is nothing more to say.
    pub details: String,
    pub actions: Vec<NoticeAction>,
}

impl PaymentNotice {
    pub fn success(receipt: &PaymentReceipt) -> Self {
        let details = match receipt.payment_id.as_deref() {
            Some(id) if !id.is_empty() => format!("Transaction ID: {}", id),
            _ => String::new(),
        };
        PaymentNotice {
            kind: NoticeKind::Success,
            title: "Payment Successful".to_string(),
            message: "Thank you for your order. Your payment has been processed.".to_string(),
            details,
            actions: vec![NoticeAction::new("Continue Shopping", ActionVariant::Primary)],
        }
    }

    pub fn failure(err: &PaymentError) -> Self {
        PaymentNotice {
            kind: NoticeKind::Error,
            title: "Payment Failed".to_string(),
            message: "We could not process your payment. Please try again.".to_string(),
            details: err.to_string(),
            actions: vec![
                NoticeAction::new("Retry", ActionVariant::Primary),
                NoticeAction::new("Close", ActionVariant::Secondary),
            ],
        }
    }
}

/// Result of [`CheckoutSession::pay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentAttempt {
    /// The form blocked tokenization; focus this field.
    InvalidForm(CheckoutField),
    /// Total is zero; the pay button stays disabled.
    NothingToPay,
    Completed(PaymentNotice),
    Failed(PaymentNotice),
}

// =============================================================================
// Session
// =============================================================================

/// What the form should render for one field after an edit or blur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFeedback {
    pub field: CheckoutField,
    /// Value after sanitising, to write back into the input.
    pub value: String,
    pub valid: bool,
    /// Error to show inline. `None` before the first submit attempt.
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    form: CheckoutForm,
    submitted: bool,
    payment_bound: bool,
}

impl CheckoutSession {
    /// A fresh panel: empty form, errors hidden, widget unbound.
    pub fn open() -> Self {
        debug!("Checkout panel opened");
        Self::default()
    }

    /// Re-opening the panel keeps the typed values but hides errors again.
    pub fn reopen(&mut self) {
        self.submitted = false;
        self.payment_bound = false;
        debug!("Checkout panel reopened");
    }

    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Stores a keystroke's worth of input.
    pub fn edit(&mut self, field: CheckoutField, raw: &str) -> FieldFeedback {
        let value = sanitize_input(field, raw);
        self.form.set(field, value);
        self.feedback(field)
    }

    /// Field lost focus. Only surfaces errors after a submit attempt.
    pub fn blur(&mut self, field: CheckoutField) -> FieldFeedback {
        self.feedback(field)
    }

    /// Marks the form as submitted and validates every field.
    ///
    /// Returns the first invalid field in form order.
    pub fn submit(&mut self) -> Result<(), CheckoutField> {
        self.submitted = true;
        match self.form.first_invalid() {
            Some(field) => {
                debug!(field = %field, "Checkout form invalid");
                Err(field)
            }
            None => Ok(()),
        }
    }

    /// Subtotal, tax for the form's state, and total.
    pub fn amounts(&self, subtotal: Money) -> CheckoutAmounts {
        CheckoutAmounts::compute(subtotal, &self.form.state)
    }

    /// The request used to bind the widget. Produced once per session.
    pub fn payment_request(&mut self, subtotal: Money) -> Option<PaymentRequest> {
        if self.payment_bound {
            return None;
        }
        let request = self.request_for(subtotal)?;
        self.payment_bound = true;
        Some(request)
    }

    /// Runs the handoff against the current cart total.
    pub fn pay<S, W>(&mut self, store: &mut CartStore<S>, widget: &mut W) -> PaymentAttempt
    where
        S: KeyValueStore,
        W: PaymentWidget,
    {
        if let Err(field) = self.submit() {
            return PaymentAttempt::InvalidForm(field);
        }

        let Some(request) = self.request_for(store.get_total()) else {
            warn!("Payment refused, nothing to pay");
            return PaymentAttempt::NothingToPay;
        };

        match widget.charge(&request) {
            Ok(receipt) => {
                info!(
                    amount_cents = request.amount_cents,
                    payment_id = ?receipt.payment_id,
                    "Payment completed"
                );
                store.clear();
                store.close();
                PaymentAttempt::Completed(PaymentNotice::success(&receipt))
            }
            Err(err) => {
                error!(amount_cents = request.amount_cents, error = %err, "Payment error");
                PaymentAttempt::Failed(PaymentNotice::failure(&err))
            }
        }
    }

    fn request_for(&self, subtotal: Money) -> Option<PaymentRequest> {
        let amounts = self.amounts(subtotal);
        if !amounts.is_payable() {
            return None;
        }
        match amounts.amount_cents() {
            Ok(amount_cents) => Some(PaymentRequest { amount_cents }),
            Err(e) => {
                error!(error = %e, "Checkout total cannot be charged");
                None
            }
        }
    }

    fn feedback(&self, field: CheckoutField) -> FieldFeedback {
        let value = self.form.get(field).to_string();
        let check = check_field(field, &value);
        let message = if self.submitted && !check.valid {
            Some(check.message)
        } else {
            None
        };
        FieldFeedback {
            field,
            value,
            valid: check.valid,
            message,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::events::EventBus;
    use crate::storage::MemoryStorage;
    use tundra_core::ProductInput;

    struct FakeWidget {
        result: Result<PaymentReceipt, PaymentError>,
        charged: Vec<PaymentRequest>,
    }

    impl FakeWidget {
        fn approving(id: Option<&str>) -> Self {
            FakeWidget {
                result: Ok(PaymentReceipt {
                    payment_id: id.map(str::to_string),
                }),
                charged: Vec::new(),
            }
        }

        fn declining(reason: &str) -> Self {
            FakeWidget {
                result: Err(PaymentError::Declined(reason.to_string())),
                charged: Vec::new(),
            }
        }
    }

    impl PaymentWidget for FakeWidget {
        fn charge(&mut self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
            self.charged.push(*request);
            self.result.clone()
        }
    }

    fn filled_session() -> CheckoutSession {
        let mut session = CheckoutSession::open();
        session.edit(CheckoutField::Name, "Nanook Okpik");
        session.edit(CheckoutField::Email, "nanook@example.com");
        session.edit(CheckoutField::Address, "12 Permafrost Way");
        session.edit(CheckoutField::City, "Nome");
        session.edit(CheckoutField::State, "ca");
        session.edit(CheckoutField::Zip, "99762");
        session
    }

    fn store_with(price_cents: i64) -> CartStore<MemoryStorage> {
        let mut store =
            CartStore::init(MemoryStorage::new(), StoreConfig::default(), EventBus::new());
        store.add_item(&ProductInput::new("parka").with_price(Money::from_cents(price_cents)));
        store.open();
        store
    }

    #[test]
    fn test_errors_hidden_until_submit() {
        let mut session = CheckoutSession::open();

        let feedback = session.edit(CheckoutField::Email, "not-an-email");
        assert!(!feedback.valid);
        assert_eq!(feedback.message, None);

        assert_eq!(session.submit(), Err(CheckoutField::Name));

        let feedback = session.edit(CheckoutField::Email, "still-bad");
        assert_eq!(
            feedback.message.as_deref(),
            Some("Please enter a valid email address")
        );
        assert!(session.blur(CheckoutField::Name).message.is_some());
    }

    #[test]
    fn test_reopen_hides_errors_again() {
        let mut session = CheckoutSession::open();
        let _ = session.submit();
        assert!(session.is_submitted());

        session.reopen();
        assert!(!session.is_submitted());
        assert_eq!(session.blur(CheckoutField::Name).message, None);
    }

    #[test]
    fn test_edit_sanitises() {
        let mut session = CheckoutSession::open();
        assert_eq!(session.edit(CheckoutField::State, "n.y").value, "NY");
        assert_eq!(session.edit(CheckoutField::Zip, "99762-12ab34").value, "99762-1234");
        assert_eq!(session.form().state, "NY");
    }

    #[test]
    fn test_amounts_follow_state_field() {
        let mut session = CheckoutSession::open();
        let subtotal = Money::from_cents(10000);

        assert_eq!(session.amounts(subtotal).tax, Money::from_cents(700));

        session.edit(CheckoutField::State, "CA");
        let amounts = session.amounts(subtotal);
        assert_eq!(amounts.tax, Money::from_cents(825));
        assert_eq!(amounts.pay_label(), "Pay $108.25");
    }

    #[test]
    fn test_payment_request_once_per_session() {
        let mut session = filled_session();
        let subtotal = Money::from_cents(10000);

        assert_eq!(
            session.payment_request(subtotal),
            Some(PaymentRequest { amount_cents: 10825 })
        );
        assert_eq!(session.payment_request(subtotal), None);

        session.reopen();
        assert!(session.payment_request(subtotal).is_some());
    }

    #[test]
    fn test_no_payment_request_for_empty_total() {
        let mut session = filled_session();
        assert_eq!(session.payment_request(Money::zero()), None);
    }

    #[test]
    fn test_pay_blocked_by_invalid_form() {
        let mut session = filled_session();
        session.edit(CheckoutField::Zip, "123");
        let mut store = store_with(5000);
        let mut widget = FakeWidget::approving(Some("sq_1"));

        let attempt = session.pay(&mut store, &mut widget);

        assert_eq!(attempt, PaymentAttempt::InvalidForm(CheckoutField::Zip));
        assert!(widget.charged.is_empty());
        assert!(!store.is_empty());
    }

    #[test]
    fn test_pay_success_clears_cart() {
        let mut session = filled_session();
        let mut store = store_with(5000);
        let mut widget = FakeWidget::approving(Some("sq_123"));

        let attempt = session.pay(&mut store, &mut widget);

        assert_eq!(widget.charged, vec![PaymentRequest { amount_cents: 5413 }]);
        assert!(store.is_empty());
        assert!(!store.is_open());
        match attempt {
            PaymentAttempt::Completed(notice) => {
                assert_eq!(notice.kind, NoticeKind::Success);
                assert_eq!(notice.title, "Payment Successful");
                assert_eq!(notice.details, "Transaction ID: sq_123");
                assert_eq!(notice.actions[0].label, "Continue Shopping");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_pay_success_without_id() {
        let notice = PaymentNotice::success(&PaymentReceipt::default());
        assert!(notice.details.is_empty());
    }

    #[test]
    fn test_pay_failure_keeps_cart() {
        let mut session = filled_session();
        let mut store = store_with(5000);
        let mut widget = FakeWidget::declining("card expired");

        let attempt = session.pay(&mut store, &mut widget);

        assert!(!store.is_empty());
        match attempt {
            PaymentAttempt::Failed(notice) => {
                assert_eq!(notice.title, "Payment Failed");
                assert_eq!(
                    notice.message,
                    "We could not process your payment. Please try again."
                );
                assert_eq!(notice.details, "Payment declined: card expired");
                let labels: Vec<&str> = notice.actions.iter().map(|a| a.label.as_str()).collect();
                assert_eq!(labels, vec!["Retry", "Close"]);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_pay_with_free_cart() {
        let mut session = filled_session();
        let mut store = store_with(0);
        let mut widget = FakeWidget::approving(None);

        assert_eq!(session.pay(&mut store, &mut widget), PaymentAttempt::NothingToPay);
        assert!(widget.charged.is_empty());
    }
}
