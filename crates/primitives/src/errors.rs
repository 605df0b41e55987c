//! Errors for the escrow primitives.

use thiserror::Error;

use crate::money::Currency;

/// Errors from arithmetic on [`Money`](crate::money::Money).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The two operands are denominated in different currencies.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// The currency of the left-hand operand.
        expected: Currency,
        /// The currency of the right-hand operand.
        actual: Currency,
    },

    /// The result does not fit into the quantity type.
    #[error("amount overflow")]
    Overflow,

    /// The subtraction would produce a negative amount.
    #[error("amount underflow")]
    Underflow,
}

/// Error while parsing a currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid currency code {0:?}: must be three ascii uppercase letters")]
pub struct InvalidCurrency(pub String);

/// Error while parsing a hex encoded identifier.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid identifier: {0}")]
pub struct ParseIdError(#[from] hex::FromHexError);
