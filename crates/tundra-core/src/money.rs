//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types for handling prices safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With binary floats:                                                    │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  Integer cents fix sums, but not rates:                                 │
//! │    NY tax is 8.875% → $100.00 × 8.875% = $8.875 (half a cent)          │
//! │                                                                         │
//! │  OUR SOLUTION: Exact decimals, rounded only at the edges               │
//! │    • Display: "$8.88"                                                   │
//! │    • Payment widget: 888 cents                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tundra_core::money::{Money, TaxRate};
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price * 3;                // $32.97
//! let tax = line.calculate_tax(TaxRate::from_bps(825));
//!
//! assert_eq!(line.to_string(), "$32.97");
//! assert_eq!(tax.to_string(), "$2.72"); // 2.720025 before display rounding
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in major currency units (dollars), held as an exact
/// decimal.
///
/// ## JSON Form
/// Serialized as a plain number (`24.99`) to match the persisted cart layout;
/// deserialized from either a number or a numeric string.
///
/// ## Where Money is Used
/// ```text
/// ProductInput.price ──► LineItem.base_price ──► × quantity ──► cart total
///                                                                   │
///                         estimate_tax(total, region) ◄─────────────┘
///                                   │
///                                   ▼
///                      CheckoutAmounts.total ──► to_cents() ──► widget
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[ts(type = "number")]
    Decimal,
);

impl Money {
    /// Wraps a decimal amount in major units.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use tundra_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -$5.50.
    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money::from_cents(major * 100 - minor)
        } else {
            Money::from_cents(major * 100 + minor)
        }
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub fn non_negative(self) -> Self {
        if self.is_negative() {
            Money::zero()
        } else {
            self
        }
    }

    /// Rounds to whole cents, half away from zero.
    ///
    /// This is the display rounding; nothing inside the cart calls it.
    pub fn round_to_cents(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Converts to integer cents for the payment handoff.
    ///
    /// ```rust
    /// use tundra_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let total = Money::new(Decimal::new(108875, 4)); // $10.8875
    /// assert_eq!(total.to_cents().unwrap(), 1089);
    /// ```
    pub fn to_cents(&self) -> CoreResult<i64> {
        let cents = (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        cents
            .to_i64()
            .ok_or_else(|| CoreError::AmountOutOfRange(self.0.to_string()))
    }

    /// Calculates tax on this amount.
    ///
    /// The result is the exact product `amount × rate`, floored at zero.
    /// No cent rounding happens here.
    ///
    /// ```rust
    /// use tundra_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_cents(10000);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax, Money::from_cents(825));
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.fraction()).non_negative()
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders the single fixed display format: `$12.34` / `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_cents().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}${:.2}", sign, rounded.abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parses `"24.99"` or `"$24.99"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        Decimal::from_str(digits).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a line-item quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// A tax rate held as a decimal fraction (`0.0825` for 8.25%).
///
/// ## Why Not Basis Points?
/// Some regional rates need a finer grain than 1/10000: New York's 8.875%
/// is 887.5 bps. A decimal fraction keeps every rate in the table exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(#[ts(type = "number")] Decimal);

impl TaxRate {
    /// Creates a tax rate from basis points (825 = 8.25%).
    #[inline]
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(i64::from(bps), 4))
    }

    /// Creates a tax rate from a fraction (`Decimal::new(8875, 5)` = 8.875%).
    #[inline]
    pub const fn from_fraction(fraction: Decimal) -> Self {
        TaxRate(fraction)
    }

    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (8.25 for 8.25%).
    #[inline]
    pub fn percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
