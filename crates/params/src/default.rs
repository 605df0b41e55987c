//! Default values for the escrow parameters.

use escrow_primitives::money::Currency;

/// Default currency deposits are taken in.
pub(crate) const CURRENCY: Currency = Currency::GBP;

/// Default number of minor units (pence) in one major unit (pound).
pub(crate) const MINOR_UNITS_PER_MAJOR: u64 = 100;
