//! The interface to the shared ledger.

use async_trait::async_trait;
use escrow_contract::{
    cash::CashState,
    transaction::{LedgerState, LedgerTransaction, SignedTransaction, StateAndRef, WireTransaction},
};
use escrow_primitives::{
    deposit::DepositRecord,
    money::{Currency, Money},
    types::{LinearId, StateRef, TxId},
};
use secp256k1::XOnlyPublicKey;

use crate::errors::{DbError, DbResult};

/// What happened to a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The transaction is final.
    Committed(TxId),

    /// Another transaction consumed one of the inputs first.
    Conflict {
        /// The input that was already consumed.
        state_ref: StateRef,
        /// The transaction that consumed it.
        consumed_by: TxId,
    },
}

/// Read and write access to the committed ledger.
///
/// A committed transaction consumes its inputs for good. Of two transactions that consume the
/// same state, only the first to be submitted is committed.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Gets, if present, the current version of the deposit identified by `linear_id`.
    async fn unconsumed_deposit(
        &self,
        linear_id: LinearId,
    ) -> DbResult<Option<StateAndRef<DepositRecord>>>;

    /// Gets, if present, the state created at `state_ref`, consumed or not.
    async fn state(&self, state_ref: StateRef) -> DbResult<Option<LedgerState>>;

    /// Gets the unconsumed cash owned by `owner`, in a stable order.
    async fn unconsumed_cash(&self, owner: XOnlyPublicKey)
        -> DbResult<Vec<StateAndRef<CashState>>>;

    /// Verifies and, if no input has been consumed yet, commits `tx`.
    ///
    /// Fails if the signatures are incomplete or the contracts reject the transaction.
    /// Submitting an already committed transaction again reports it as committed.
    async fn submit(&self, tx: SignedTransaction) -> DbResult<SubmitOutcome>;

    /// Gets, if present, a committed transaction.
    async fn transaction(&self, txid: TxId) -> DbResult<Option<SignedTransaction>>;

    /// Gets every committed version of a deposit, oldest first.
    async fn history(&self, linear_id: LinearId) -> DbResult<Vec<StateAndRef<DepositRecord>>>;

    /// Gets the current version of every live deposit `party` takes part in.
    async fn deposits_for(&self, party: XOnlyPublicKey)
        -> DbResult<Vec<StateAndRef<DepositRecord>>>;

    /// Sums the unconsumed cash `owner` holds in `currency`.
    async fn cash_balance(&self, owner: XOnlyPublicKey, currency: Currency) -> DbResult<Money> {
        let cash = self.unconsumed_cash(owner).await?;

        let mut balance = Money::zero(currency);
        for held in cash.iter().filter(|c| c.state.amount.currency == currency) {
            balance = balance.checked_add(held.state.amount)?;
        }

        Ok(balance)
    }

    /// Looks up the inputs of `tx` so that the contracts can be run over it.
    async fn resolve(&self, tx: &WireTransaction) -> DbResult<LedgerTransaction> {
        let mut resolved = Vec::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            let state = self
                .state(*input)
                .await?
                .ok_or(DbError::UnknownState(*input))?;
            resolved.push(StateAndRef::new(state, *input));
        }

        Ok(tx.resolve(resolved)?)
    }
}
