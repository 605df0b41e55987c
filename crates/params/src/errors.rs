//! Errors for the escrow parameters.

use escrow_primitives::money::Currency;
use thiserror::Error;

/// Error while validating parameters or converting amounts with them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// The minor-unit scale must be a positive power of ten.
    #[error("minor units per major unit must be a positive power of ten, got {0}")]
    InvalidScale(u64),

    /// The amount does not fit in a quantity of minor units.
    #[error("{major} {currency} overflows the minor-unit quantity")]
    AmountOverflow {
        /// The amount in major units.
        major: u64,

        /// The currency of the amount.
        currency: Currency,
    },
}
