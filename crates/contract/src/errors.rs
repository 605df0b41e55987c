//! Errors raised while building, signing or verifying a transaction.

use escrow_primitives::{
    deposit::DepositField,
    errors::MoneyError,
    money::{Currency, Money},
    party::Role,
    types::StateRef,
};
use secp256k1::XOnlyPublicKey;
use thiserror::Error;

use crate::commands::DepositCommand;

/// A reason the contract rejects a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A transaction touching a deposit carries no deposit command.
    #[error("no deposit command found")]
    MissingDepositCommand,

    /// A transaction carries more than one deposit command.
    #[error("expected exactly one deposit command, found {0}")]
    MultipleDepositCommands(usize),

    /// The signer set of the command omits a party the command requires.
    #[error("{command} must be signed by the {role}")]
    MissingSigner {
        /// The command being verified.
        command: DepositCommand,
        /// The role whose key is absent from the signer set.
        role: Role,
    },

    /// A creation consumes states.
    #[error("no inputs should be consumed when creating a deposit, found {0}")]
    CreateConsumesInputs(usize),

    /// A creation records a deposit of nothing.
    #[error("the deposit amount must be positive")]
    ZeroDeposit,

    /// A creation produces something other than a single deposit.
    #[error("only one output state should be created when creating a deposit, found {0}")]
    CreateOutputs(usize),

    /// The wrong number of deposit records are consumed.
    #[error("{command} must consume {expected} deposit(s), found {actual}")]
    DepositInputs {
        /// The command being verified.
        command: DepositCommand,
        /// The number of deposit inputs the command needs.
        expected: usize,
        /// The number of deposit inputs found.
        actual: usize,
    },

    /// The wrong number of deposit records are produced.
    #[error("{command} must produce {expected} deposit(s), found {actual}")]
    DepositOutputs {
        /// The command being verified.
        command: DepositCommand,
        /// The number of deposit outputs the command needs.
        expected: usize,
        /// The number of deposit outputs found.
        actual: usize,
    },

    /// The successor does not continue the consumed deposit.
    #[error("the output deposit has a different linear id from the input")]
    LinearIdChanged,

    /// The landlord and the tenant are the same party.
    #[error("the landlord and the tenant cannot be the same entity")]
    LandlordIsTenant,

    /// The successor changes a field the command may not touch.
    #[error("{command} may not change {field}")]
    ForbiddenChange {
        /// The command being verified.
        command: DepositCommand,
        /// The field that changed.
        field: DepositField,
    },

    /// The consumed deposit has already been paid out.
    #[error("the deposit has already been refunded")]
    AlreadyRefunded,

    /// Only a paid out deposit may leave the ledger.
    #[error("the deposit has not been refunded yet")]
    NotRefunded,

    /// The command needs the deposit to have been paid in.
    #[error("the deposit has not been funded yet")]
    NotFunded,

    /// The deposit is already funded.
    #[error("the deposit has already been funded")]
    AlreadyFunded,

    /// The recorded payment differs from the agreed deposit.
    #[error("amount deposited must equal {expected}, found {actual:?}")]
    DepositedAmountMismatch {
        /// The agreed deposit.
        expected: Money,
        /// The recorded payment.
        actual: Option<Money>,
    },

    /// A funding transaction does not spend exactly one cash state.
    #[error("funding must consume exactly one cash state, found {0}")]
    FundCashInputs(usize),

    /// A funding transaction pays nothing to the scheme.
    #[error("funding must pay cash to the issuer")]
    MissingIssuerPayment,

    /// The cash paid to the scheme differs from the recorded deposit.
    #[error("the issuer must receive {expected}, received {actual}")]
    IssuerPaymentMismatch {
        /// The recorded deposit.
        expected: Money,
        /// The cash the issuer receives.
        actual: Money,
    },

    /// The landlord tries to deduct after the tenant has responded.
    #[error("the tenant has already responded to the deductions")]
    TenantAlreadyResponded,

    /// The landlord's successor list does not add a deduction.
    #[error("at least one deduction must be added")]
    NoDeductionAdded,

    /// The landlord's successor list rewrites earlier deductions.
    #[error("previously proposed deductions may not be changed")]
    DeductionsRewritten,

    /// A landlord deduction has a zero amount.
    #[error("deduction {reason:?} must have a positive amount")]
    ZeroDeduction {
        /// The reason of the offending deduction.
        reason: String,
    },

    /// A deduction is not denominated in the deposit currency.
    #[error("deduction {reason:?} must be in {expected}, found {actual}")]
    DeductionCurrency {
        /// The reason of the offending deduction.
        reason: String,
        /// The deposit currency.
        expected: Currency,
        /// The deduction currency.
        actual: Currency,
    },

    /// The deductions add up to more than the deposit.
    #[error("deductions total {total} exceeds the deposit of {deposit}")]
    DeductionsExceedDeposit {
        /// The deductions total.
        total: Money,
        /// The deposit.
        deposit: Money,
    },

    /// The tenant responds before the landlord has deducted anything.
    #[error("the landlord has not proposed any deductions")]
    NoLandlordDeductions,

    /// The tenant lists a deduction the landlord never proposed.
    #[error("deduction {reason:?} was not proposed by the landlord")]
    UnknownDeduction {
        /// The reason of the invented deduction.
        reason: String,
    },

    /// The tenant accepts deductions that differ from the landlord's.
    #[error("only the landlord's deductions may be accepted as proposed")]
    AcceptanceMismatch,

    /// Deductions are accepted before the tenant has responded.
    #[error("the tenant has not responded to the deductions")]
    NoTenantDeductions,

    /// The deductions were already settled.
    #[error("the deductions have already been accepted")]
    AlreadyAccepted,

    /// A refund was already requested.
    #[error("a refund has already been requested")]
    RefundAlreadyRequested,

    /// The landlord's deductions are still being negotiated.
    #[error("the landlord's deductions have not been accepted")]
    UnsettledDeductions,

    /// A payout field was not set.
    #[error("{field} must be set by {command}")]
    FieldNotSet {
        /// The command being verified.
        command: DepositCommand,
        /// The field left empty.
        field: DepositField,
    },

    /// A party is paid the wrong amount on refund.
    #[error("the {role} must be paid {expected}, paid {actual}")]
    PayoutMismatch {
        /// The party being paid.
        role: Role,
        /// The share owed.
        expected: Money,
        /// The cash received.
        actual: Money,
    },

    /// Cash states appear without exactly one cash command.
    #[error("expected exactly one cash command, found {0}")]
    CashCommands(usize),

    /// Cash is created out of nothing by a move, or destroyed.
    #[error("cash in {currency} is not conserved: {inputs} in, {outputs} out")]
    CashNotConserved {
        /// The currency being compared.
        currency: Currency,
        /// The minor units consumed.
        inputs: u64,
        /// The minor units produced.
        outputs: u64,
    },

    /// An issuance consumes cash.
    #[error("issuing cash must not consume cash")]
    IssueConsumesCash,

    /// A cash command produces no cash.
    #[error("a cash command must produce cash")]
    NoCashOutputs,

    /// A cash state holds nothing.
    #[error("cash states must hold a positive amount")]
    ZeroCash,

    /// Cash is moved without the owner's signature.
    #[error("cash owned by {0} is moved without its signature")]
    CashOwnerNotSigning(XOnlyPublicKey),

    /// The issuance is not signed by anyone.
    #[error("issuing cash must be signed")]
    UnsignedIssue,

    /// The issuance is not signed by any recognised cash issuer.
    #[error("issuing cash must be signed by a recognised issuer")]
    UnauthorizedIssue,

    /// Arithmetic on an amount failed.
    #[error("money: {0}")]
    Money(#[from] MoneyError),
}

/// The result type for contract verification.
pub type ContractResult<T> = Result<T, ContractViolation>;

/// Errors in the transaction envelope, independent of the contract rules.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The transaction could not be encoded.
    #[error("encoding: {0}")]
    Encoding(#[from] bincode::Error),

    /// A signature does not verify against the transaction id.
    #[error("invalid signature by {0}")]
    InvalidSignature(XOnlyPublicKey),

    /// A required signer has not signed.
    #[error("missing signature by {0}")]
    MissingSignature(XOnlyPublicKey),

    /// The resolved inputs do not match the referenced ones.
    #[error("input {0} could not be resolved")]
    UnresolvedInput(StateRef),
}
