//! Parameters governing the money held in escrow.

use escrow_primitives::money::{Currency, Money};
use serde::{Deserialize, Serialize};

use crate::{default, errors::ParamsError};

/// The parameters all three parties of a deposit share.
///
/// Two nodes with different values here will disagree on which proposals are valid, so every
/// party loads the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowParams {
    /// The only currency deposits may be taken in.
    pub currency: Currency,

    /// The number of minor units in one major unit of [`Self::currency`].
    pub minor_units_per_major: u64,
}

impl Default for EscrowParams {
    fn default() -> Self {
        Self {
            currency: default::CURRENCY,
            minor_units_per_major: default::MINOR_UNITS_PER_MAJOR,
        }
    }
}

impl EscrowParams {
    /// Checks that the parameters are usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let mut scale = self.minor_units_per_major;
        if scale == 0 {
            return Err(ParamsError::InvalidScale(scale));
        }

        while scale % 10 == 0 {
            scale /= 10;
        }

        if scale != 1 {
            return Err(ParamsError::InvalidScale(self.minor_units_per_major));
        }

        Ok(())
    }

    /// Converts a whole number of major units into [`Money`].
    pub fn major(&self, major: u64) -> Result<Money, ParamsError> {
        major
            .checked_mul(self.minor_units_per_major)
            .map(|quantity| Money::new(quantity, self.currency))
            .ok_or(ParamsError::AmountOverflow {
                major,
                currency: self.currency,
            })
    }
}
