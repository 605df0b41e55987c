use std::collections::BTreeSet;

use secp256k1::XOnlyPublicKey;

use super::require_signers;
use crate::{
    commands::DepositCommand,
    errors::{ContractResult, ContractViolation},
    transaction::LedgerTransaction,
};

/// A deposit is created out of nothing as the only output of its transaction, between a
/// landlord and a tenant who are different parties, for a positive amount.
pub(super) fn verify_create(
    tx: &LedgerTransaction,
    signers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    if !tx.inputs.is_empty() {
        return Err(ContractViolation::CreateConsumesInputs(tx.inputs.len()));
    }

    if tx.outputs.len() != 1 {
        return Err(ContractViolation::CreateOutputs(tx.outputs.len()));
    }

    let outputs = tx.deposit_outputs();
    let [output] = outputs.as_slice() else {
        return Err(ContractViolation::DepositOutputs {
            command: DepositCommand::Create,
            expected: 1,
            actual: 0,
        });
    };

    require_signers(DepositCommand::Create, signers, output)?;

    if output.landlord.key == output.tenant.key {
        return Err(ContractViolation::LandlordIsTenant);
    }

    if output.deposit_amount.is_zero() {
        return Err(ContractViolation::ZeroDeposit);
    }

    Ok(())
}
