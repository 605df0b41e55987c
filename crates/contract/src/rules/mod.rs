//! The deposit contract, one module per group of lifecycle steps.
//!
//! Every step except [`DepositCommand::Create`] consumes exactly one deposit record. Apart from
//! [`DepositCommand::Exit`], it also produces exactly one successor that may only differ from
//! its predecessor in [`DepositCommand::permitted_fields`].

mod create;
mod deductions;
mod fund;
mod lifecycle;
mod payout;

use std::collections::BTreeSet;

use escrow_primitives::{deposit::DepositRecord, money::Money};
use secp256k1::XOnlyPublicKey;

use crate::{
    commands::DepositCommand,
    errors::{ContractResult, ContractViolation},
    transaction::LedgerTransaction,
};

/// Verifies the deposit part of a transaction.
///
/// Transactions that neither touch a deposit record nor carry a deposit command pass trivially.
pub fn verify_deposit(tx: &LedgerTransaction) -> ContractResult<()> {
    let commands = tx.deposit_commands();
    let touches_deposit = !tx.deposit_inputs().is_empty() || !tx.deposit_outputs().is_empty();

    if commands.is_empty() && !touches_deposit {
        return Ok(());
    }

    let command = match commands.as_slice() {
        [] => return Err(ContractViolation::MissingDepositCommand),
        [command] => command,
        many => return Err(ContractViolation::MultipleDepositCommands(many.len())),
    };

    let Some(deposit_command) = command.as_deposit() else {
        return Err(ContractViolation::MissingDepositCommand);
    };
    let signers = &command.signers;

    match deposit_command {
        DepositCommand::Create => create::verify_create(tx, signers),
        DepositCommand::CoSign => lifecycle::verify_cosign(tx, signers),
        DepositCommand::Fund => fund::verify_fund(tx, signers),
        DepositCommand::LandlordDeduct => deductions::verify_landlord_deduct(tx, signers),
        DepositCommand::TenantDeduct => deductions::verify_tenant_deduct(tx, signers),
        DepositCommand::AcceptDeductions => deductions::verify_accept_deductions(tx, signers),
        DepositCommand::RequestRefund => lifecycle::verify_request_refund(tx, signers),
        DepositCommand::Refund => payout::verify_refund(tx, signers),
        DepositCommand::Arbitrate => payout::verify_arbitrate(tx, signers),
        DepositCommand::Exit => lifecycle::verify_exit(tx, signers),
    }
}

/// Checks that every role `command` requires appears in `signers`.
fn require_signers(
    command: DepositCommand,
    signers: &BTreeSet<XOnlyPublicKey>,
    record: &DepositRecord,
) -> ContractResult<()> {
    match command
        .required_roles()
        .iter()
        .find(|role| !signers.contains(&record.party(**role).key))
    {
        Some(role) => Err(ContractViolation::MissingSigner {
            command,
            role: *role,
        }),
        None => Ok(()),
    }
}

/// Checks that `tx` consumes exactly one deposit record.
fn single_input(
    tx: &LedgerTransaction,
    command: DepositCommand,
) -> ContractResult<&DepositRecord> {
    let inputs = tx.deposit_inputs();
    let [input] = inputs.as_slice() else {
        return Err(ContractViolation::DepositInputs {
            command,
            expected: 1,
            actual: inputs.len(),
        });
    };

    Ok(*input)
}

/// Checks the shape shared by every step that replaces a deposit record with its successor.
///
/// Returns the consumed record and its successor.
fn transition<'tx>(
    tx: &'tx LedgerTransaction,
    command: DepositCommand,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<(&'tx DepositRecord, &'tx DepositRecord)> {
    let input = single_input(tx, command)?;

    let outputs = tx.deposit_outputs();
    let [output] = outputs.as_slice() else {
        return Err(ContractViolation::DepositOutputs {
            command,
            expected: 1,
            actual: outputs.len(),
        });
    };

    if input.is_refunded() {
        return Err(ContractViolation::AlreadyRefunded);
    }

    require_signers(command, signers, input)?;

    if input.linear_id != output.linear_id {
        return Err(ContractViolation::LinearIdChanged);
    }

    let permitted = command.permitted_fields();
    if let Some(field) = input
        .changed_fields(output)
        .into_iter()
        .find(|field| !permitted.contains(field))
    {
        return Err(ContractViolation::ForbiddenChange { command, field });
    }

    Ok((input, *output))
}

/// Returns the amount held by the scheme, failing if the deposit was never paid in.
fn ensure_funded(record: &DepositRecord) -> ContractResult<Money> {
    record.amount_deposited.ok_or(ContractViolation::NotFunded)
}

/// Checks that every amount is in the deposit currency and that together they do not exceed
/// the deposit. Returns their total.
fn total_within_deposit<'a>(
    items: impl IntoIterator<Item = (&'a str, &'a Money)>,
    deposit: Money,
) -> ContractResult<Money> {
    let mut total = Money::zero(deposit.currency);

    for (reason, amount) in items {
        if amount.currency != deposit.currency {
            return Err(ContractViolation::DeductionCurrency {
                reason: reason.to_string(),
                expected: deposit.currency,
                actual: amount.currency,
            });
        }
        total = total.checked_add(*amount)?;
    }

    if total.quantity > deposit.quantity {
        return Err(ContractViolation::DeductionsExceedDeposit { total, deposit });
    }

    Ok(total)
}
