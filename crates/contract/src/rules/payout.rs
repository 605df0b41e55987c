//! Paying the deposit out, either as agreed or as ruled by the scheme.

use std::collections::BTreeSet;

use escrow_primitives::{
    deduction::Deduction,
    deposit::{DepositField, DepositRecord},
    money::Money,
    party::Role,
};
use secp256k1::XOnlyPublicKey;

use super::{ensure_funded, total_within_deposit, transition};
use crate::{
    cash::total_owned_by,
    commands::DepositCommand,
    errors::{ContractResult, ContractViolation},
    settlement::split_refund,
    transaction::LedgerTransaction,
};

/// The scheme pays out the deposit minus the settled deductions to the tenant and the rest to
/// the landlord.
///
/// A deposit the landlord never deducted from is paid back in full. Deductions that are still
/// being negotiated block the refund.
pub(super) fn verify_refund(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let command = DepositCommand::Refund;
    let (input, output) = transition(tx, command, signers)?;
    let deposited = ensure_funded(input)?;

    if output.refunded_at.is_none() {
        return Err(ContractViolation::FieldNotSet {
            command,
            field: DepositField::RefundedAt,
        });
    }

    let settled: &[Deduction] = match (
        input.landlord_deductions.as_deref(),
        input.accepted_deductions.as_deref(),
    ) {
        (_, Some(accepted)) => accepted,
        (None, None) => &[],
        (Some(_), None) => return Err(ContractViolation::UnsettledDeductions),
    };

    let total = total_within_deposit(
        settled.iter().map(|d| (d.reason.as_str(), &d.amount)),
        deposited,
    )?;

    verify_payout(tx, input, deposited, total)
}

/// The scheme rules on deductions the parties could not agree on and pays out accordingly.
pub(super) fn verify_arbitrate(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let command = DepositCommand::Arbitrate;
    let (input, output) = transition(tx, command, signers)?;
    let deposited = ensure_funded(input)?;

    if input.accepted_deductions.is_some() {
        return Err(ContractViolation::AlreadyAccepted);
    }

    let Some(contested) = output.contested_deductions.as_deref() else {
        return Err(ContractViolation::FieldNotSet {
            command,
            field: DepositField::ContestedDeductions,
        });
    };

    if output.refunded_at.is_none() {
        return Err(ContractViolation::FieldNotSet {
            command,
            field: DepositField::RefundedAt,
        });
    }

    let total = total_within_deposit(
        contested.iter().map(|d| (d.reason.as_str(), &d.amount)),
        deposited,
    )?;

    verify_payout(tx, input, deposited, total)
}

fn verify_payout(
    tx: &LedgerTransaction,
    record: &DepositRecord,
    deposited: Money,
    deductions: Money,
) -> ContractResult<()> {
    let split = split_refund(deposited, deductions)?;
    let cash_outputs = tx.cash_outputs();

    for (role, expected) in [(Role::Tenant, split.tenant), (Role::Landlord, split.landlord)] {
        let paid = total_owned_by(
            cash_outputs.iter().copied(),
            &record.party(role).key,
            deposited.currency,
        )?;

        if paid != expected {
            return Err(ContractViolation::PayoutMismatch {
                role,
                expected,
                actual: paid,
            });
        }
    }

    Ok(())
}
