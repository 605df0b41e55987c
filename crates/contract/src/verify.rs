//! The single entry point every party runs before signing or committing a transaction.

use crate::{
    cash::verify_cash, errors::ContractResult, rules::verify_deposit,
    transaction::LedgerTransaction,
};

/// Runs every contract over `tx`.
///
/// The deposit rules are checked first so that a transaction which is wrong on both counts
/// reports the deposit violation.
pub fn verify(tx: &LedgerTransaction) -> ContractResult<()> {
    verify_deposit(tx)?;
    verify_cash(tx)
}
