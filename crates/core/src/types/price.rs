//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices as decimal strings (`"12.50"`). They are kept as
//! [`Decimal`] end to end so line totals and subtotals never pick up float
//! rounding error.

use std::fmt;
use std::iter::Sum;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Create a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// A zero amount in the default currency.
    #[must_use]
    pub const fn zero() -> Self {
        Self::usd(Decimal::ZERO)
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Amount in minor units, rounded half-up to the cent.
    #[must_use]
    pub fn cents(&self) -> i64 {
        use rust_decimal::prelude::ToPrimitive;
        (self.rounded() * Decimal::ONE_HUNDRED)
            .to_i64()
            .unwrap_or(0)
    }

    /// Amount rounded half away from zero to the cent.
    fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        if rounded.is_sign_negative() {
            write!(f, "-{}{:.2}", self.currency_code.symbol(), rounded.abs())
        } else {
            write!(f, "{}{:.2}", self.currency_code.symbol(), rounded)
        }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut currency_code = CurrencyCode::default();
        let mut amount = Decimal::ZERO;
        for price in iter {
            currency_code = price.currency_code;
            amount += price.amount;
        }
        Self::new(amount, currency_code)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol used for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter code as sent to the payment processor.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::CAD => "CAD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn usd(s: &str) -> Price {
        Price::usd(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(usd("12.5").to_string(), "$12.50");
        assert_eq!(usd("4").to_string(), "$4.00");
        assert_eq!(usd("0.005").to_string(), "$0.01");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(usd("-3.25").to_string(), "-$3.25");
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [usd("4.99").times(3), usd("12.00").times(2)];
        let subtotal: Price = lines.into_iter().sum();
        assert_eq!(subtotal, usd("38.97"));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let subtotal: Price = std::iter::empty().sum();
        assert_eq!(subtotal, Price::zero());
    }

    #[test]
    fn test_cents() {
        assert_eq!(usd("19.99").cents(), 1999);
        assert_eq!(Price::from_cents(1250, CurrencyCode::USD), usd("12.50"));
    }
}
