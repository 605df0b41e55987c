//! Deductions claimed against a deposit and the comparison helpers the contract rules rely on.

use serde::{Deserialize, Serialize};

use crate::{
    attachment::AttachmentRef,
    errors::MoneyError,
    money::{Currency, Money},
};

/// A single deduction the landlord claims against the deposit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deduction {
    /// Why the money is being withheld, e.g. "carpet damage".
    pub reason: String,
    /// How much is being withheld.
    pub amount: Money,
    /// The attachment holding the supporting evidence.
    pub evidence: AttachmentRef,
}

/// The fields of a [`Deduction`] that may be excluded from a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeductionField {
    /// [`Deduction::reason`]
    Reason,
    /// [`Deduction::amount`]
    Amount,
    /// [`Deduction::evidence`]
    Evidence,
}

impl DeductionField {
    /// Every field of a [`Deduction`].
    pub const ALL: [DeductionField; 3] = [
        DeductionField::Reason,
        DeductionField::Amount,
        DeductionField::Evidence,
    ];
}

impl Deduction {
    /// Creates a new deduction.
    pub fn new(reason: impl Into<String>, amount: Money, evidence: AttachmentRef) -> Self {
        Self {
            reason: reason.into(),
            amount,
            evidence,
        }
    }

    /// Returns a copy of this deduction with a revised amount.
    pub fn with_amount(&self, amount: Money) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Compares two deductions field by field, ignoring the `excluded` fields.
    pub fn equal_excluding(&self, other: &Deduction, excluded: &[DeductionField]) -> bool {
        DeductionField::ALL
            .iter()
            .filter(|field| !excluded.contains(field))
            .all(|field| match field {
                DeductionField::Reason => self.reason == other.reason,
                DeductionField::Amount => self.amount == other.amount,
                DeductionField::Evidence => self.evidence == other.evidence,
            })
    }

    /// Sums the amounts of a list of deductions in `currency`.
    pub fn total(deductions: &[Deduction], currency: Currency) -> Result<Money, MoneyError> {
        Money::sum(deductions.iter().map(|d| &d.amount), currency)
    }
}

/// Returns `true` if every element of `subset` has a counterpart in `superset` when the
/// `excluded` fields are ignored.
///
/// Used to check that a tenant may revise the amount of a deduction but never invent one.
pub fn contains_all_excluding(
    superset: &[Deduction],
    subset: &[Deduction],
    excluded: &[DeductionField],
) -> bool {
    subset.iter().all(|candidate| {
        superset
            .iter()
            .any(|known| known.equal_excluding(candidate, excluded))
    })
}

/// The arbitrator's ruling on one contested deduction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArbitratorDeduction {
    /// The reason the arbitrator upholds.
    pub reason: String,
    /// The amount the arbitrator awards to the landlord.
    pub amount: Money,
}

impl ArbitratorDeduction {
    /// Creates a new arbitrator ruling.
    pub fn new(reason: impl Into<String>, amount: Money) -> Self {
        Self {
            reason: reason.into(),
            amount,
        }
    }

    /// Sums the amounts of a list of rulings in `currency`.
    pub fn total(
        deductions: &[ArbitratorDeduction],
        currency: Currency,
    ) -> Result<Money, MoneyError> {
        Money::sum(deductions.iter().map(|d| &d.amount), currency)
    }
}
