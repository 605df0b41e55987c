use escrow_contract::errors::{ContractViolation, TransactionError};
use escrow_primitives::{
    attachment::AttachmentRef,
    errors::MoneyError,
    types::{LinearId, StateRef},
};
use thiserror::Error;

/// Errors raised by the ledger and attachment stores.
#[derive(Debug, Error)]
pub enum DbError {
    /// The transaction envelope is malformed or not fully signed.
    #[error("transaction: {0}")]
    Transaction(#[from] TransactionError),

    /// The transaction breaks a contract rule.
    #[error("contract: {0}")]
    Contract(#[from] ContractViolation),

    /// An input points at a state the ledger has never seen.
    #[error("unknown state {0}")]
    UnknownState(StateRef),

    /// A transaction consumes the same state twice.
    #[error("state {0} is consumed twice by the same transaction")]
    DuplicateInput(StateRef),

    /// A transaction produces a new deposit under an id that already has a version on the
    /// ledger, without consuming that version.
    #[error("deposit {0} already exists")]
    LinearIdTaken(LinearId),

    /// No attachment is stored under the reference.
    #[error("attachment {0} not found")]
    AttachmentNotFound(AttachmentRef),

    /// The stored bytes no longer hash to their reference.
    #[error("attachment {0} is corrupt")]
    CorruptAttachment(AttachmentRef),

    /// Arithmetic on stored amounts failed.
    #[error("money: {0}")]
    Money(#[from] MoneyError),

    /// The filesystem failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// The result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
