use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use escrow_contract::{
    cash::{verify_issuance, CashState},
    commands::{CashCommand, Command},
    transaction::{
        LedgerState, PartySignature, SignedTransaction, StateAndRef, TransactionBuilder,
    },
    verify::verify,
};
use escrow_primitives::{
    deposit::DepositRecord,
    money::Money,
    types::{LinearId, StateRef, TxId},
};
use secp256k1::{Keypair, XOnlyPublicKey};
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use crate::{
    errors::{DbError, DbResult},
    ledger::{LedgerStore, SubmitOutcome},
};

#[derive(Debug, Default)]
struct Tables {
    /// txid -> signed transaction
    transactions: HashMap<TxId, SignedTransaction>,

    /// every state ever created, consumed or not
    states: HashMap<StateRef, LedgerState>,

    /// consumed state -> consuming txid
    consumed: HashMap<StateRef, TxId>,

    /// linear_id -> every version of the deposit, oldest first
    versions: HashMap<LinearId, Vec<StateRef>>,
}

impl Tables {
    fn deposit_at(&self, state_ref: &StateRef) -> Option<StateAndRef<DepositRecord>> {
        self.states
            .get(state_ref)
            .and_then(LedgerState::as_deposit)
            .map(|record| StateAndRef::new(record.clone(), *state_ref))
    }

    fn is_consumed(&self, state_ref: &StateRef) -> bool {
        self.consumed.contains_key(state_ref)
    }
}

/// A ledger held in memory and shared by every party of a test or a local scenario.
///
/// Every submission is checked and applied under a single write lock, so the order in which
/// submissions take the lock is the order of finality.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    tables: Arc<RwLock<Tables>>,

    /// keys allowed to sign a cash issuance
    cash_issuers: Arc<BTreeSet<XOnlyPublicKey>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger on which no one may issue cash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ledger on which the given keys may issue cash.
    pub fn with_cash_issuers(issuers: impl IntoIterator<Item = XOnlyPublicKey>) -> Self {
        Self {
            tables: Arc::default(),
            cash_issuers: Arc::new(issuers.into_iter().collect()),
        }
    }

    /// Issues `amount` of new cash to `owner`, signed by `issuer`.
    pub async fn issue_cash(
        &self,
        issuer: &Keypair,
        owner: XOnlyPublicKey,
        amount: Money,
    ) -> DbResult<StateAndRef<CashState>> {
        let mut builder = TransactionBuilder::new();
        builder
            .add_output(CashState::new(owner, amount))
            .add_command(Command::cash(
                CashCommand::Issue,
                [issuer.x_only_public_key().0],
            ));
        let tx = builder.build();

        let txid = tx.id()?;
        let state_ref = StateRef::new(txid, 0);
        let signed =
            SignedTransaction::new(tx).with_signature(PartySignature::sign(&txid, issuer));

        match self.submit(signed).await? {
            SubmitOutcome::Committed(_) => {
                Ok(StateAndRef::new(CashState::new(owner, amount), state_ref))
            }
            // a fresh issuance consumes nothing, so it cannot conflict
            SubmitOutcome::Conflict { state_ref, .. } => Err(DbError::UnknownState(state_ref)),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn unconsumed_deposit(
        &self,
        linear_id: LinearId,
    ) -> DbResult<Option<StateAndRef<DepositRecord>>> {
        let tables = self.tables.read().await;

        Ok(tables
            .versions
            .get(&linear_id)
            .and_then(|versions| versions.last())
            .filter(|latest| !tables.is_consumed(latest))
            .and_then(|latest| tables.deposit_at(latest)))
    }

    async fn state(&self, state_ref: StateRef) -> DbResult<Option<LedgerState>> {
        Ok(self.tables.read().await.states.get(&state_ref).cloned())
    }

    async fn unconsumed_cash(
        &self,
        owner: XOnlyPublicKey,
    ) -> DbResult<Vec<StateAndRef<CashState>>> {
        let tables = self.tables.read().await;

        let mut cash: Vec<_> = tables
            .states
            .iter()
            .filter(|(state_ref, _)| !tables.is_consumed(state_ref))
            .filter_map(|(state_ref, state)| {
                state
                    .as_cash()
                    .filter(|cash| cash.owner == owner)
                    .map(|cash| StateAndRef::new(*cash, *state_ref))
            })
            .collect();
        cash.sort_by_key(|c| c.state_ref);

        Ok(cash)
    }

    async fn submit(&self, tx: SignedTransaction) -> DbResult<SubmitOutcome> {
        let txid = tx.id()?;
        let mut tables = self.tables.write().await;

        if tables.transactions.contains_key(&txid) {
            debug!(%txid, "transaction already committed");
            return Ok(SubmitOutcome::Committed(txid));
        }

        tx.verify_signatures()?;

        let mut seen = BTreeSet::new();
        if let Some(duplicate) = tx.tx.inputs.iter().find(|input| !seen.insert(**input)) {
            return Err(DbError::DuplicateInput(*duplicate));
        }

        let mut resolved = Vec::with_capacity(tx.tx.inputs.len());
        for input in &tx.tx.inputs {
            let state = tables
                .states
                .get(input)
                .cloned()
                .ok_or(DbError::UnknownState(*input))?;
            resolved.push(StateAndRef::new(state, *input));
        }

        if let Some((state_ref, consumed_by)) = tx
            .tx
            .inputs
            .iter()
            .find_map(|input| tables.consumed.get(input).map(|by| (*input, *by)))
        {
            warn!(%txid, %state_ref, %consumed_by, "rejecting double spend");
            return Ok(SubmitOutcome::Conflict {
                state_ref,
                consumed_by,
            });
        }

        let ltx = tx.tx.resolve(resolved)?;
        verify(&ltx)?;
        verify_issuance(&ltx, &self.cash_issuers)?;

        for record in ltx.deposit_outputs() {
            let current = tables
                .versions
                .get(&record.linear_id)
                .and_then(|versions| versions.last());
            if current.is_some_and(|current| !tx.tx.inputs.contains(current)) {
                warn!(%txid, linear_id = %record.linear_id, "rejecting duplicate deposit");
                return Err(DbError::LinearIdTaken(record.linear_id));
            }
        }

        trace!(
            %txid,
            inputs = tx.tx.inputs.len(),
            outputs = tx.tx.outputs.len(),
            "applying transaction"
        );

        for input in &tx.tx.inputs {
            tables.consumed.insert(*input, txid);
        }

        for (index, output) in tx.tx.outputs.iter().enumerate() {
            let state_ref = StateRef::new(txid, index as u32);
            if let Some(record) = output.as_deposit() {
                tables
                    .versions
                    .entry(record.linear_id)
                    .or_default()
                    .push(state_ref);
            }
            tables.states.insert(state_ref, output.clone());
        }

        let commands: Vec<_> = tx.tx.commands.iter().map(|c| c.kind.to_string()).collect();
        tables.transactions.insert(txid, tx);

        info!(%txid, ?commands, "transaction committed");

        Ok(SubmitOutcome::Committed(txid))
    }

    async fn transaction(&self, txid: TxId) -> DbResult<Option<SignedTransaction>> {
        Ok(self.tables.read().await.transactions.get(&txid).cloned())
    }

    async fn history(&self, linear_id: LinearId) -> DbResult<Vec<StateAndRef<DepositRecord>>> {
        let tables = self.tables.read().await;

        Ok(tables
            .versions
            .get(&linear_id)
            .map(|versions| {
                versions
                    .iter()
                    .filter_map(|state_ref| tables.deposit_at(state_ref))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn deposits_for(
        &self,
        party: XOnlyPublicKey,
    ) -> DbResult<Vec<StateAndRef<DepositRecord>>> {
        let tables = self.tables.read().await;

        let mut deposits: Vec<_> = tables
            .versions
            .values()
            .filter_map(|versions| versions.last())
            .filter(|latest| !tables.is_consumed(latest))
            .filter_map(|latest| tables.deposit_at(latest))
            .filter(|deposit| deposit.state.role_of(&party).is_some())
            .collect();
        deposits.sort_by_key(|d| d.state.linear_id);

        Ok(deposits)
    }
}
