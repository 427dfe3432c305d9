//! # Tax & Totals Estimator
//!
//! Checkout-side estimate of sales tax from the shipping state code.
//!
//! ## Rate Table
//! ```text
//! ┌──────────┬──────────┐
//! │ Region   │ Rate     │
//! ├──────────┼──────────┤
//! │ CA       │ 8.25%    │
//! │ NY       │ 8.875%   │
//! │ TX       │ 8.25%    │
//! │ WA       │ 9.5%     │
//! │ FL       │ 7%       │
//! │ IL       │ 10.25%   │
//! │ (other)  │ 7%       │
//! └──────────┴──────────┘
//! ```
//!
//! Everything here is a pure function of `(subtotal, region)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::{Money, TaxRate};

/// Rate used for unknown, empty or malformed region codes (7%).
pub fn default_rate() -> TaxRate {
    TaxRate::from_bps(700)
}

/// Looks up the rate for an already-normalised region code.
pub fn rate_for_region(code: &str) -> Option<TaxRate> {
    let rate = match code {
        "CA" | "TX" => TaxRate::from_bps(825),
        "NY" => TaxRate::from_fraction(Decimal::new(8875, 5)),
        "WA" => TaxRate::from_bps(950),
        "FL" => TaxRate::from_bps(700),
        "IL" => TaxRate::from_bps(1025),
        _ => return None,
    };
    Some(rate)
}

/// Uppercases and strips every character that is not an ASCII letter.
///
/// ```rust
/// use tundra_core::tax::normalize_region_code;
///
/// assert_eq!(normalize_region_code(" ny "), "NY");
/// assert_eq!(normalize_region_code("c.a"), "CA");
/// ```
pub fn normalize_region_code(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Rate that applies to a raw region code.
pub fn effective_rate(raw_region: &str) -> TaxRate {
    let code = normalize_region_code(raw_region);
    if code.len() != 2 {
        return default_rate();
    }
    rate_for_region(&code).unwrap_or_else(default_rate)
}

/// Estimated tax on `subtotal` for `region`, floored at zero.
///
/// ```rust
/// use tundra_core::money::Money;
/// use tundra_core::tax::estimate_tax;
///
/// let hundred = Money::from_cents(10000);
/// assert_eq!(estimate_tax(hundred, "CA"), Money::from_cents(825));
/// assert_eq!(estimate_tax(hundred, "ZZ"), Money::from_cents(700));
/// assert_eq!(estimate_tax(Money::zero(), "NY"), Money::zero());
/// ```
pub fn estimate_tax(subtotal: Money, region: &str) -> Money {
    subtotal.calculate_tax(effective_rate(region))
}

// =============================================================================
// Checkout Amounts
// =============================================================================

/// Subtotal, estimated tax and grand total shown in the checkout panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutAmounts {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl CheckoutAmounts {
    pub fn compute(subtotal: Money, region: &str) -> Self {
        let tax = estimate_tax(subtotal, region);
        CheckoutAmounts {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// Grand total in integer cents, as the payment widget expects.
    pub fn amount_cents(&self) -> CoreResult<i64> {
        self.total.to_cents()
    }

    /// Whether there is anything to pay.
    pub fn is_payable(&self) -> bool {
        self.total.is_positive()
    }

    /// Pay button caption: `"Pay $12.34"`, or `"Pay Now"` when nothing is due.
    pub fn pay_label(&self) -> String {
        if self.is_payable() {
            format!("Pay {}", self.total)
        } else {
            "Pay Now".to_string()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
