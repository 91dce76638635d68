//! Money amounts using decimal arithmetic.
//!
//! The backend prices everything in US dollars, so [`Price`] carries no
//! currency code. Amounts accept either JSON numbers or decimal strings on the
//! way in and serialize as strings so no precision is lost.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A US dollar amount.
///
/// ```
/// use rust_decimal::Decimal;
/// use sheshape_core::Price;
///
/// let price = Price::new(Decimal::new(123_450, 2));
/// assert_eq!(price.display(), "$1,234.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal dollar amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Format for display with a dollar sign, thousands separators and two
    /// decimal places (half-up rounding), e.g. `$1,234.50` or `-$5.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{:.2}", rounded.abs());
        let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}${grouped}.{cents}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// Line total: unit price times quantity.
impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_cents(0).display(), "$0.00");
        assert_eq!(Price::from_cents(4999).display(), "$49.99");
        assert_eq!(Price::from_cents(100_000).display(), "$1,000.00");
        assert_eq!(Price::from_cents(123_456_789).display(), "$1,234,567.89");
    }

    #[test]
    fn test_display_rounds_and_signs() {
        assert_eq!(Price::new(Decimal::new(19_995, 3)).display(), "$20.00");
        assert_eq!(Price::from_cents(-500).display(), "-$5.00");
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let from_number: Price = serde_json::from_str("49.99").unwrap();
        let from_string: Price = serde_json::from_str("\"49.99\"").unwrap();
        assert_eq!(from_number, Price::from_cents(4999));
        assert_eq!(from_string, Price::from_cents(4999));
    }

    #[test]
    fn test_line_total_and_sum() {
        let line = Price::from_cents(1250) * 3;
        assert_eq!(line, Price::from_cents(3750));

        let total: Price = [line, Price::from_cents(250)].into_iter().sum();
        assert_eq!(total.display(), "$40.00");
    }
}
