//! # Money
//!
//! Integer pesos-and-centavos for every amount the console adds up.
//!
//! ```text
//!   backend JSON                wire boundary               everything else
//!   "precio_venta": 1299.9  ──► Money::from_major ──► 129_990 centavos
//!   "total": "8500"                                    (subtotals, sale totals,
//!                                                       inventory value)
//!   sale payload            ◄── Money::to_major   ◄──
//! ```
//!
//! Floats exist only on either side of that boundary, so summing
//! thousands of prices never drifts.
//!
//! ## Usage
//! ```rust
//! use almacen_core::money::Money;
//!
//! let price = Money::from_cents(100_000); // $ 1.000
//! let subtotal = price.multiply_quantity(2);
//! assert_eq!(subtotal.to_string(), "$ 2.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// An amount in centavos. Signed so subtraction stays closed; the
/// normalizer clamps negative backend amounts with [`Money::non_negative`].
///
/// Arithmetic saturates at the `i64` bounds: amounts come from the backend
/// unchecked, and a sum over them must never panic or wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Wraps a centavo count.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a backend amount expressed in major units.
    ///
    /// Only the wire boundary calls this. Non-finite input becomes zero;
    /// amounts past the `i64` range saturate.
    ///
    /// ```rust
    /// use almacen_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(1299.9).cents(), 129_990);
    /// assert_eq!(Money::from_major(f64::NAN), Money::zero());
    /// ```
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the amount in major units, for wire serialization only.
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Raw centavo count.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole pesos, truncated toward zero.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Centavos past the whole pesos, 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// A refund or a malformed backend amount.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns zero for negative amounts, the amount otherwise.
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Line subtotal for `qty` units at this unit price.
    ///
    /// ```rust
    /// use almacen_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(350_000);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 1_050_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the console's currency format: `$ 12.345` with a dot as
/// thousands separator and `,dd` only when there are cents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let units = group_thousands(self.units().unsigned_abs());
        if self.cents_part() == 0 {
            write!(f, "{}$ {}", sign, units)
        } else {
            write!(f, "{}$ {},{:02}", sign, units, self.cents_part())
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
