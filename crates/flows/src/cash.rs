//! Adding cash movements to a transaction under construction.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use escrow_contract::{
    cash::CashState,
    commands::{CashCommand, Command},
    transaction::{StateAndRef, TransactionBuilder},
};
use escrow_db::ledger::LedgerStore;
use escrow_primitives::money::{Currency, Money};
use secp256k1::XOnlyPublicKey;
use tracing::debug;

use crate::errors::{FlowError, FlowResult};

/// Moves cash between parties as part of a larger transaction.
#[async_trait]
pub trait MoneyMovement: Send + Sync {
    /// Pays every `(payee, amount)` out of `payer`'s unconsumed cash.
    ///
    /// Adds a single cash state covering the total as input, one output per non-zero payment,
    /// change back to the payer and a [`CashCommand::Move`] signed by the payer. Returns the
    /// cash consumed.
    async fn generate_spend(
        &self,
        builder: &mut TransactionBuilder,
        payer: XOnlyPublicKey,
        payees: &[(XOnlyPublicKey, Money)],
    ) -> FlowResult<Vec<StateAndRef<CashState>>>;
}

/// A [`MoneyMovement`] that selects cash straight from the ledger.
#[derive(Clone)]
pub struct LedgerCash {
    ledger: Arc<dyn LedgerStore>,
}

impl fmt::Debug for LedgerCash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerCash").finish_non_exhaustive()
    }
}

impl LedgerCash {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }
}

/// Checks that every payment is in the same currency and returns it with the total.
fn total_payments(payees: &[(XOnlyPublicKey, Money)]) -> FlowResult<Option<(Currency, Money)>> {
    let Some((_, first)) = payees.first() else {
        return Ok(None);
    };

    let total = Money::sum(payees.iter().map(|(_, amount)| amount), first.currency)?;

    Ok(Some((first.currency, total)))
}

#[async_trait]
impl MoneyMovement for LedgerCash {
    async fn generate_spend(
        &self,
        builder: &mut TransactionBuilder,
        payer: XOnlyPublicKey,
        payees: &[(XOnlyPublicKey, Money)],
    ) -> FlowResult<Vec<StateAndRef<CashState>>> {
        let Some((currency, required)) = total_payments(payees)? else {
            return Err(FlowError::InvalidRequest("nothing to pay".to_string()));
        };

        if required.is_zero() {
            return Err(FlowError::InvalidRequest(format!(
                "payments from {payer} add up to zero"
            )));
        }

        let held: Vec<_> = self
            .ledger
            .unconsumed_cash(payer)
            .await?
            .into_iter()
            .filter(|cash| cash.state.amount.currency == currency)
            .collect();

        // the smallest single state that covers every payment
        let Some(selected) = held
            .iter()
            .filter(|cash| cash.state.amount.quantity >= required.quantity)
            .min_by_key(|cash| cash.state.amount.quantity)
            .cloned()
        else {
            let available = held
                .iter()
                .map(|cash| cash.state.amount)
                .max_by_key(|amount| amount.quantity)
                .unwrap_or_else(|| Money::zero(currency));

            return Err(FlowError::InsufficientFunds {
                payer,
                required,
                available,
            });
        };

        debug!(%payer, %required, input = %selected.state_ref, "selected cash");

        builder.add_input(selected.state_ref);

        for (payee, amount) in payees.iter().filter(|(_, amount)| !amount.is_zero()) {
            builder.add_output(CashState::new(*payee, *amount));
        }

        let change = selected.state.amount.checked_sub(required)?;
        if !change.is_zero() {
            builder.add_output(CashState::new(payer, change));
        }

        builder.add_command(Command::cash(CashCommand::Move, [payer]));

        Ok(vec![selected])
    }
}
