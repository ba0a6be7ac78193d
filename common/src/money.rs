//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Non-negative amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    amount: Decimal,

    /// [`Currency`] of this amount.
    currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] if the given `amount` is non-negative.
    #[must_use]
    pub fn new(amount: Decimal, currency: Currency) -> Option<Self> {
        (!amount.is_sign_negative()).then_some(Self { amount, currency })
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the [`Currency`] of this [`Money`].
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Indicates whether this [`Money`] is a zero amount.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        // `split_at_checked` keeps multibyte input from panicking on a
        // non-boundary split.
        let (amount, currency) =
            s.split_at_checked(s.len() - 3).ok_or("invalid currency")?;
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Self::new(amount, currency).ok_or("negative amount")
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money::new(decimal("123.45"), Currency::Usd).unwrap(),
        );

        assert_eq!(
            Money::from_str("0EUR").unwrap(),
            Money::new(decimal("0"), Currency::Eur).unwrap(),
        );

        assert_eq!(Money::from_str("-1USD"), Err("negative amount"));
        assert_eq!(Money::from_str("1XXX"), Err("invalid currency"));
        assert_eq!(Money::from_str("1"), Err("too short"));

        // Splitting 3 bytes off `"1€a"` falls inside the `€`.
        assert_eq!(Money::from_str("1€a"), Err("invalid currency"));
    }

    #[test]
    fn display() {
        let money = Money::new(decimal("15"), Currency::Usd).unwrap();
        assert_eq!(money.to_string(), "15USD");

        let money = Money::new(decimal("9.99"), Currency::Eur).unwrap();
        assert_eq!(money.to_string(), "9.99EUR");
    }

    #[test]
    fn zero_amount_is_free() {
        assert!(Money::new(decimal("0"), Currency::Usd).unwrap().is_free());
        assert!(!Money::new(decimal("0.01"), Currency::Usd)
            .unwrap()
            .is_free());
    }
}
