use std::collections::BTreeSet;

use escrow_primitives::deposit::DepositField;
use secp256k1::XOnlyPublicKey;

use super::{ensure_funded, require_signers, single_input, transition};
use crate::{
    commands::DepositCommand,
    errors::{ContractResult, ContractViolation},
    transaction::LedgerTransaction,
};

/// All three parties re-affirm the current version unchanged.
pub(super) fn verify_cosign(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    transition(tx, DepositCommand::CoSign, signers).map(|_| ())
}

/// The tenant asks the scheme, once, to pay the deposit out.
pub(super) fn verify_request_refund(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let command = DepositCommand::RequestRefund;
    let (input, output) = transition(tx, command, signers)?;
    ensure_funded(input)?;

    if input.refund_requested_at.is_some() {
        return Err(ContractViolation::RefundAlreadyRequested);
    }

    if output.refund_requested_at.is_none() {
        return Err(ContractViolation::FieldNotSet {
            command,
            field: DepositField::RefundRequestedAt,
        });
    }

    Ok(())
}

/// A paid out deposit is consumed without a successor.
pub(super) fn verify_exit(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let command = DepositCommand::Exit;
    let input = single_input(tx, command)?;

    let outputs = tx.deposit_outputs();
    if !outputs.is_empty() {
        return Err(ContractViolation::DepositOutputs {
            command,
            expected: 0,
            actual: outputs.len(),
        });
    }

    if !input.is_refunded() {
        return Err(ContractViolation::NotRefunded);
    }

    require_signers(command, signers, input)
}
