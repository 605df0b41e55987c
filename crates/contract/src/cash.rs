//! Fungible cash and the rule that keeps it conserved.

use std::collections::{BTreeMap, BTreeSet};

use escrow_primitives::money::{Currency, Money};
use secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Serialize};

use crate::{
    commands::CashCommand,
    errors::{ContractResult, ContractViolation},
    transaction::LedgerTransaction,
};

/// An amount of cash held by a single owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashState {
    /// The key that must sign to spend this cash.
    pub owner: XOnlyPublicKey,
    /// How much the state is worth.
    pub amount: Money,
}

impl CashState {
    /// Creates a new cash state.
    pub const fn new(owner: XOnlyPublicKey, amount: Money) -> Self {
        Self { owner, amount }
    }
}

/// Sums the cash owned by `owner` in `currency` among `states`.
pub fn total_owned_by<'a>(
    states: impl IntoIterator<Item = &'a CashState>,
    owner: &XOnlyPublicKey,
    currency: Currency,
) -> ContractResult<Money> {
    let owned = states
        .into_iter()
        .filter(|cash| &cash.owner == owner)
        .map(|cash| &cash.amount);

    Ok(Money::sum(owned, currency)?)
}

fn totals_by_currency<'a>(
    states: impl IntoIterator<Item = &'a CashState>,
) -> ContractResult<BTreeMap<Currency, Money>> {
    let mut totals: BTreeMap<Currency, Money> = BTreeMap::new();

    for cash in states {
        let total = totals
            .entry(cash.amount.currency)
            .or_insert_with(|| Money::zero(cash.amount.currency));
        *total = total.checked_add(cash.amount)?;
    }

    Ok(totals)
}

/// Verifies the cash part of a transaction.
///
/// Transactions that neither touch cash nor carry a cash command pass trivially.
pub fn verify_cash(tx: &LedgerTransaction) -> ContractResult<()> {
    let inputs = tx.cash_inputs();
    let outputs = tx.cash_outputs();
    let commands = tx.cash_commands();

    if inputs.is_empty() && outputs.is_empty() && commands.is_empty() {
        return Ok(());
    }

    let [command] = commands.as_slice() else {
        return Err(ContractViolation::CashCommands(commands.len()));
    };

    if outputs.is_empty() {
        return Err(ContractViolation::NoCashOutputs);
    }

    if outputs.iter().any(|cash| cash.amount.is_zero()) {
        return Err(ContractViolation::ZeroCash);
    }

    match command.as_cash() {
        Some(CashCommand::Issue) => {
            if !inputs.is_empty() {
                return Err(ContractViolation::IssueConsumesCash);
            }

            if command.signers.is_empty() {
                return Err(ContractViolation::UnsignedIssue);
            }

            Ok(())
        }
        Some(CashCommand::Move) => {
            if let Some(unsigned) = inputs
                .iter()
                .find(|cash| !command.signers.contains(&cash.owner))
            {
                return Err(ContractViolation::CashOwnerNotSigning(unsigned.owner));
            }

            let consumed = totals_by_currency(inputs.iter().copied())?;
            let produced = totals_by_currency(outputs.iter().copied())?;

            let currencies = consumed.keys().chain(produced.keys());
            for currency in currencies {
                let zero = Money::zero(*currency);
                let spent = consumed.get(currency).unwrap_or(&zero);
                let created = produced.get(currency).unwrap_or(&zero);

                if spent != created {
                    return Err(ContractViolation::CashNotConserved {
                        currency: *currency,
                        inputs: spent.quantity,
                        outputs: created.quantity,
                    });
                }
            }

            Ok(())
        }
        // filtered by `cash_commands`
        None => Err(ContractViolation::CashCommands(0)),
    }
}

/// Checks that every issuance in `tx` is signed by one of the recognised cash `issuers`.
///
/// Applied by the ledger on top of [`verify_cash`] with the issuers it was configured with.
pub fn verify_issuance(
    tx: &LedgerTransaction,
    issuers: &BTreeSet<XOnlyPublicKey>,
) -> ContractResult<()> {
    let unauthorized = tx
        .cash_commands()
        .into_iter()
        .filter(|command| command.as_cash() == Some(CashCommand::Issue))
        .any(|command| command.signers.is_disjoint(issuers));

    if unauthorized {
        return Err(ContractViolation::UnauthorizedIssue);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use escrow_primitives::types::{StateRef, TxId};
    use escrow_test_utils::prelude::*;

    use super::*;
    use crate::{
        commands::Command,
        transaction::{StateAndRef, TransactionBuilder},
    };

    fn ledger_tx(
        inputs: Vec<CashState>,
        outputs: Vec<CashState>,
        commands: Vec<Command>,
    ) -> LedgerTransaction {
        let resolved: Vec<StateAndRef> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, cash)| {
                StateAndRef::new(cash.into(), StateRef::new(TxId::from([1u8; 32]), i as u32))
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

        builder.build().resolve(resolved).unwrap()
    }

    #[test]
    fn move_must_conserve_value() {
        let cast = Cast::generate();
        let tenant = cast.tenant.key();
        let issuer = cast.issuer.key();

        let balanced = ledger_tx(
            vec![CashState::new(tenant, pounds(1_200))],
            vec![
                CashState::new(issuer, pounds(1_000)),
                CashState::new(tenant, pounds(200)),
            ],
            vec![Command::cash(CashCommand::Move, [tenant])],
        );
        assert_eq!(verify_cash(&balanced), Ok(()));

        let inflated = ledger_tx(
            vec![CashState::new(tenant, pounds(1_000))],
            vec![CashState::new(issuer, pounds(1_001))],
            vec![Command::cash(CashCommand::Move, [tenant])],
        );
        assert!(matches!(
            verify_cash(&inflated),
            Err(ContractViolation::CashNotConserved { .. })
        ));
    }

    #[test]
    fn move_must_be_signed_by_every_owner() {
        let cast = Cast::generate();
        let tenant = cast.tenant.key();

        let tx = ledger_tx(
            vec![CashState::new(tenant, pounds(10))],
            vec![CashState::new(cast.issuer.key(), pounds(10))],
            vec![Command::cash(CashCommand::Move, [cast.issuer.key()])],
        );

        assert_eq!(
            verify_cash(&tx),
            Err(ContractViolation::CashOwnerNotSigning(tenant))
        );
    }

    #[test]
    fn issue_creates_cash_from_nothing() {
        let cast = Cast::generate();
        let issuer = cast.issuer.key();

        let issue = ledger_tx(
            vec![],
            vec![CashState::new(cast.tenant.key(), pounds(5_000))],
            vec![Command::cash(CashCommand::Issue, [issuer])],
        );
        assert_eq!(verify_cash(&issue), Ok(()));

        let spending_issue = ledger_tx(
            vec![CashState::new(issuer, pounds(1))],
            vec![CashState::new(cast.tenant.key(), pounds(5_000))],
            vec![Command::cash(CashCommand::Issue, [issuer])],
        );
        assert_eq!(
            verify_cash(&spending_issue),
            Err(ContractViolation::IssueConsumesCash)
        );
    }

    #[test]
    fn cash_needs_exactly_one_command_and_positive_amounts() {
        let cast = Cast::generate();
        let tenant = cast.tenant.key();

        let no_command = ledger_tx(
            vec![CashState::new(tenant, pounds(1))],
            vec![CashState::new(tenant, pounds(1))],
            vec![],
        );
        assert_eq!(
            verify_cash(&no_command),
            Err(ContractViolation::CashCommands(0))
        );

        let zero = ledger_tx(
            vec![],
            vec![CashState::new(tenant, pounds(0))],
            vec![Command::cash(CashCommand::Issue, [tenant])],
        );
        assert_eq!(verify_cash(&zero), Err(ContractViolation::ZeroCash));
    }

    #[test]
    fn only_recognised_issuers_may_mint() {
        let cast = Cast::generate();
        let issuers = BTreeSet::from([cast.issuer.key()]);

        let by_issuer = ledger_tx(
            vec![],
            vec![CashState::new(cast.tenant.key(), pounds(5_000))],
            vec![Command::cash(CashCommand::Issue, [cast.issuer.key()])],
        );
        assert_eq!(verify_issuance(&by_issuer, &issuers), Ok(()));

        let self_issued = ledger_tx(
            vec![],
            vec![CashState::new(cast.tenant.key(), pounds(1_000_000))],
            vec![Command::cash(CashCommand::Issue, [cast.tenant.key()])],
        );
        assert_eq!(verify_cash(&self_issued), Ok(()));
        assert_eq!(
            verify_issuance(&self_issued, &issuers),
            Err(ContractViolation::UnauthorizedIssue)
        );
        assert_eq!(
            verify_issuance(&by_issuer, &BTreeSet::new()),
            Err(ContractViolation::UnauthorizedIssue)
        );
    }

    #[test]
    fn moves_need_no_issuer() {
        let cast = Cast::generate();
        let tenant = cast.tenant.key();

        let tx = ledger_tx(
            vec![CashState::new(tenant, pounds(10))],
            vec![CashState::new(cast.issuer.key(), pounds(10))],
            vec![Command::cash(CashCommand::Move, [tenant])],
        );

        assert_eq!(verify_issuance(&tx, &BTreeSet::new()), Ok(()));
    }

    #[test]
    fn owned_totals_ignore_other_owners() {
        let cast = Cast::generate();
        let states = [
            CashState::new(cast.issuer.key(), pounds(3)),
            CashState::new(cast.tenant.key(), pounds(4)),
            CashState::new(cast.issuer.key(), pounds(5)),
        ];

        assert_eq!(
            total_owned_by(&states, &cast.issuer.key(), pounds(0).currency),
            Ok(pounds(8))
        );
    }
}
