//! Fixed-point amounts of a single fiat currency.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{InvalidCurrency, MoneyError};

/// An ISO-4217 style three letter currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Pound sterling.
    pub const GBP: Self = Self(*b"GBP");

    /// Returns the currency code as a string slice.
    pub fn code(&self) -> &str {
        // only ascii uppercase bytes are ever stored
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for Currency {
    type Err = InvalidCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 3] = s
            .as_bytes()
            .try_into()
            .map_err(|_| InvalidCurrency(s.to_string()))?;

        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidCurrency(s.to_string()));
        }

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Currency {
    type Error = InvalidCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An amount of money expressed in minor units (pence for [`Currency::GBP`]).
///
/// Amounts are never negative. All arithmetic is checked and refuses to mix currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The number of minor units.
    pub quantity: u64,
    /// The currency the quantity is denominated in.
    pub currency: Currency,
}

impl Money {
    /// Creates a new amount of `quantity` minor units.
    pub const fn new(quantity: u64, currency: Currency) -> Self {
        Self { quantity, currency }
    }

    /// Creates a zero amount in the given currency.
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Returns `true` if the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.quantity == 0
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or(MoneyError::Overflow)?;

        Ok(Money::new(quantity, self.currency))
    }

    /// Subtracts `other` from `self`, failing if the result would be negative.
    pub fn checked_sub(self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        let quantity = self
            .quantity
            .checked_sub(other.quantity)
            .ok_or(MoneyError::Underflow)?;

        Ok(Money::new(quantity, self.currency))
    }

    /// Sums a sequence of amounts, all of which must be in `currency`.
    ///
    /// The sum of an empty sequence is zero.
    pub fn sum<'a>(
        amounts: impl IntoIterator<Item = &'a Money>,
        currency: Currency,
    ) -> Result<Money, MoneyError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, amount| acc.checked_add(*amount))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.quantity / 100,
            self.quantity % 100,
            self.currency
        )
    }
}
