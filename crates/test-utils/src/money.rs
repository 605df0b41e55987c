//! Money fixtures.

use escrow_primitives::money::{Currency, Money};
use proptest::prelude::*;

/// `major` whole pounds.
pub const fn pounds(major: u64) -> Money {
    Money::new(major * 100, Currency::GBP)
}

/// `minor` pence.
pub const fn pence(minor: u64) -> Money {
    Money::new(minor, Currency::GBP)
}

/// Any sterling amount up to `max` pence.
pub fn arb_money(max: u64) -> impl Strategy<Value = Money> {
    (0..=max).prop_map(pence)
}
