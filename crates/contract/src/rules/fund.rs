use std::collections::BTreeSet;

use secp256k1::XOnlyPublicKey;

use super::transition;
use crate::{
    cash::total_owned_by,
    commands::DepositCommand,
    errors::{ContractResult, ContractViolation},
    transaction::LedgerTransaction,
};

/// The tenant pays the agreed deposit to the scheme out of a single cash state, in the same
/// transaction that records it.
pub(super) fn verify_fund(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let (input, output) = transition(tx, DepositCommand::Fund, signers)?;

    if input.is_funded() {
        return Err(ContractViolation::AlreadyFunded);
    }

    let Some(deposited) = output
        .amount_deposited
        .filter(|amount| *amount == output.deposit_amount)
    else {
        return Err(ContractViolation::DepositedAmountMismatch {
            expected: output.deposit_amount,
            actual: output.amount_deposited,
        });
    };

    let cash_inputs = tx.cash_inputs();
    if cash_inputs.len() != 1 {
        return Err(ContractViolation::FundCashInputs(cash_inputs.len()));
    }

    let cash_outputs = tx.cash_outputs();
    let issuer = &output.issuer.key;
    if !cash_outputs.iter().any(|cash| &cash.owner == issuer) {
        return Err(ContractViolation::MissingIssuerPayment);
    }

    let paid = total_owned_by(cash_outputs.iter().copied(), issuer, deposited.currency)?;
    if paid.quantity != deposited.quantity {
        return Err(ContractViolation::IssuerPaymentMismatch {
            expected: deposited,
            actual: paid,
        });
    }

    Ok(())
}
