//! Negotiating the deductions at the end of a tenancy.

use std::collections::BTreeSet;

use escrow_primitives::{
    deduction::{contains_all_excluding, DeductionField},
    deposit::DepositField,
};
use secp256k1::XOnlyPublicKey;

use super::{ensure_funded, total_within_deposit, transition};
use crate::{
    commands::DepositCommand,
    errors::{ContractResult, ContractViolation},
    transaction::LedgerTransaction,
};

/// The landlord appends one or more deductions, until the tenant responds.
pub(super) fn verify_landlord_deduct(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let command = DepositCommand::LandlordDeduct;
    let (input, output) = transition(tx, command, signers)?;
    let deposited = ensure_funded(input)?;

    if input.tenant_deductions.is_some() {
        return Err(ContractViolation::TenantAlreadyResponded);
    }

    let before = input.landlord_deductions.as_deref().unwrap_or_default();
    let Some(after) = output.landlord_deductions.as_deref() else {
        return Err(ContractViolation::FieldNotSet {
            command,
            field: DepositField::LandlordDeductions,
        });
    };

    if after.len() <= before.len() {
        return Err(ContractViolation::NoDeductionAdded);
    }

    if after[..before.len()] != *before {
        return Err(ContractViolation::DeductionsRewritten);
    }

    if let Some(zero) = after.iter().find(|d| d.amount.is_zero()) {
        return Err(ContractViolation::ZeroDeduction {
            reason: zero.reason.clone(),
        });
    }

    total_within_deposit(
        after.iter().map(|d| (d.reason.as_str(), &d.amount)),
        deposited,
    )?;

    Ok(())
}

/// The tenant agrees to a subset of the landlord's deductions, possibly for lower amounts. If
/// the tenant agrees to all of them unchanged, the deductions may be settled in the same step.
pub(super) fn verify_tenant_deduct(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let command = DepositCommand::TenantDeduct;
    let (input, output) = transition(tx, command, signers)?;

    if input.accepted_deductions.is_some() {
        return Err(ContractViolation::AlreadyAccepted);
    }

    let Some(landlord) = input.landlord_deductions.as_deref() else {
        return Err(ContractViolation::NoLandlordDeductions);
    };

    let Some(tenant) = output.tenant_deductions.as_deref() else {
        return Err(ContractViolation::FieldNotSet {
            command,
            field: DepositField::TenantDeductions,
        });
    };

    if let Some(invented) = tenant.iter().find(|candidate| {
        !contains_all_excluding(
            landlord,
            std::slice::from_ref(*candidate),
            &[DeductionField::Amount],
        )
    }) {
        return Err(ContractViolation::UnknownDeduction {
            reason: invented.reason.clone(),
        });
    }

    total_within_deposit(
        tenant.iter().map(|d| (d.reason.as_str(), &d.amount)),
        input.deposit_amount,
    )?;

    if let Some(accepted) = output.accepted_deductions.as_deref() {
        if accepted != tenant || tenant != landlord {
            return Err(ContractViolation::AcceptanceMismatch);
        }
    }

    Ok(())
}

/// The landlord settles on the tenant's counter-proposal as it stands.
pub(super) fn verify_accept_deductions(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let (input, output) = transition(tx, DepositCommand::AcceptDeductions, signers)?;

    let Some(tenant) = input.tenant_deductions.as_deref() else {
        return Err(ContractViolation::NoTenantDeductions);
    };

    if input.accepted_deductions.is_some() {
        return Err(ContractViolation::AlreadyAccepted);
    }

    if output.accepted_deductions.as_deref() != Some(tenant) {
        return Err(ContractViolation::AcceptanceMismatch);
    }

    Ok(())
}
