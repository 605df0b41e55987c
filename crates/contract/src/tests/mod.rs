//! Tests for the deposit contract, one module per group of lifecycle steps.

mod fund;
mod payout;

use escrow_primitives::{
    deposit::DepositRecord,
    money::Money,
    types::{StateRef, TxId},
};
use escrow_test_utils::prelude::*;

use crate::{
    cash::CashState,
    commands::{CashCommand, Command, DepositCommand},
    errors::ContractResult,
    transaction::{LedgerState, LedgerTransaction, StateAndRef, TransactionBuilder},
    verify::verify,
};

// ===== Transaction Helpers =====

/// Builds a resolved transaction, placing the inputs at made-up ledger locations.
pub(super) fn ledger_tx(
    inputs: Vec<LedgerState>,
    outputs: Vec<LedgerState>,
    commands: Vec<Command>,
) -> LedgerTransaction {
    let resolved: Vec<StateAndRef> = inputs
        .into_iter()
        .enumerate()
        .map(|(index, state)| {
            StateAndRef::new(state, StateRef::new(TxId::from([0xaa; 32]), index as u32))
        })
        .collect();

    let mut builder = TransactionBuilder::new();
    for input in &resolved {
        builder.add_input(input.state_ref);
    }
    for output in outputs {
        builder.add_output(output);
    }
    for command in commands {
        builder.add_command(command);
    }

    builder
        .build()
        .resolve(resolved)
        .expect("every input is resolved")
}

/// A deposit command signed by exactly the roles it requires.
pub(super) fn signed_by_required(command: DepositCommand, cast: &Cast) -> Command {
    Command::deposit(
        command,
        command
            .required_roles()
            .iter()
            .map(|role| cast.get(*role).key()),
    )
}

/// Verifies a single-command transition from `input` to `output` without any cash.
pub(super) fn verify_transition(
    command: DepositCommand,
    cast: &Cast,
    input: &DepositRecord,
    output: &DepositRecord,
) -> ContractResult<()> {
    verify(&ledger_tx(
        vec![input.clone().into()],
        vec![output.clone().into()],
        vec![signed_by_required(command, cast)],
    ))
}

/// Verifies a payout from the scheme's `float` with the given cash `payments`.
pub(super) fn verify_payout(
    command: DepositCommand,
    cast: &Cast,
    input: &DepositRecord,
    output: &DepositRecord,
    payments: Vec<CashState>,
) -> ContractResult<()> {
    let float = CashState::new(cast.issuer.key(), input.deposit_amount);

    verify(&ledger_tx(
        vec![input.clone().into(), float.into()],
        std::iter::once(output.clone().into())
            .chain(payments.into_iter().map(Into::into))
            .collect(),
        vec![
            signed_by_required(command, cast),
            Command::cash(CashCommand::Move, [cast.issuer.key()]),
        ],
    ))
}

/// Cash paid to the tenant and the landlord, skipping empty shares.
pub(super) fn payments(cast: &Cast, tenant: Money, landlord: Money) -> Vec<CashState> {
    [
        CashState::new(cast.tenant.key(), tenant),
        CashState::new(cast.landlord.key(), landlord),
    ]
    .into_iter()
    .filter(|cash| !cash.amount.is_zero())
    .collect()
}

// ===== Record Helpers =====

/// A funded £1000 deposit.
pub(super) fn funded_record(cast: &Cast) -> DepositRecord {
    funded(&generate_record(cast))
}

/// A funded deposit with a £50 carpet deduction proposed by the landlord.
pub(super) fn deducted_record(cast: &Cast) -> DepositRecord {
    with_landlord_deductions(
        &funded_record(cast),
        vec![deduction("carpet damage", pounds(50))],
    )
}
