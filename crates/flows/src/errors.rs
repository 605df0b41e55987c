//! The ways a workflow can end without reaching finality.

use escrow_contract::{
    commands::DepositCommand,
    errors::{ContractViolation, TransactionError},
};
use escrow_db::errors::DbError;
use escrow_p2p_service::TransportError;
use escrow_primitives::{
    attachment::AttachmentRef,
    errors::MoneyError,
    money::Money,
    types::{LinearId, StateRef, TxId},
};
use secp256k1::XOnlyPublicKey;
use thiserror::Error;

use crate::progress::ProgressError;

/// Errors that end a workflow.
///
/// None of these leave a partial commit behind: either the proposed transaction is committed
/// as a whole or the ledger is left untouched.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The proposal breaks a contract rule.
    #[error("contract rejected the proposal: {0}")]
    ValidationFailure(#[from] ContractViolation),

    /// There is no unconsumed version of the deposit.
    #[error("no unconsumed deposit {0}")]
    NotFound(LinearId),

    /// A counterparty refused to sign.
    #[error("{by} declined to sign: {reason}")]
    SignatureRejected {
        /// The counterparty that declined.
        by: XOnlyPublicKey,
        /// The reason it gave.
        reason: String,
    },

    /// A competing transaction consumed one of the inputs first.
    #[error("state {state_ref} was already consumed by {consumed_by}")]
    ConflictingConsumption {
        /// The contested input.
        state_ref: StateRef,
        /// The transaction that won.
        consumed_by: TxId,
    },

    /// A counterparty could not be reached or went silent.
    #[error("transport: {0}")]
    TransportFailure(#[from] TransportError),

    /// The caller does not play the role that starts this step.
    #[error("{party} may not start {command}")]
    Unauthorized {
        /// The step.
        command: DepositCommand,
        /// The would-be initiator.
        party: XOnlyPublicKey,
    },

    /// The payer does not hold enough cash.
    #[error("{payer} holds {available} but must pay {required}")]
    InsufficientFunds {
        /// Whoever has to pay.
        payer: XOnlyPublicKey,
        /// What the step requires.
        required: Money,
        /// What the payer holds.
        available: Money,
    },

    /// The ledger or attachment store failed.
    #[error("ledger: {0}")]
    Ledger(#[from] DbError),

    /// A document the proposal refers to is not in the attachment store.
    #[error("attachment {0} is not available")]
    MissingAttachment(AttachmentRef),

    /// The transaction could not be encoded or a signature is invalid.
    #[error("transaction: {0}")]
    Transaction(#[from] TransactionError),

    /// Arithmetic on amounts failed.
    #[error("money: {0}")]
    Money(#[from] MoneyError),

    /// The request itself makes no sense, before any contract is consulted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A counterparty sent a message out of turn.
    #[error("protocol violation by {peer}: {reason}")]
    Protocol {
        /// The offending counterparty.
        peer: XOnlyPublicKey,
        /// What went wrong.
        reason: String,
    },

    /// The workflow tried to go back to an earlier step.
    #[error("progress: {0}")]
    Progress(#[from] ProgressError),
}

impl FlowError {
    /// Maps a ledger failure onto the workflow outcome it stands for.
    ///
    /// The ledger re-runs the contracts on submission, so a contract rejection surfacing from it
    /// is still a validation failure.
    pub(crate) fn from_ledger(err: DbError) -> Self {
        match err {
            DbError::Contract(violation) => FlowError::ValidationFailure(violation),
            other => FlowError::Ledger(other),
        }
    }
}

/// The result type for workflows.
pub type FlowResult<T> = Result<T, FlowError>;
