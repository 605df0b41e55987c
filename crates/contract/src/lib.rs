//! The rules that decide whether a proposed change to a deposit is legal.
//!
//! Everything in this crate is pure: [`verify`](verify::verify) looks only at the resolved
//! transaction it is given and never panics, so every party can run it independently and reach
//! the same verdict.

pub mod cash;
pub mod commands;
pub mod errors;
pub mod rules;
pub mod settlement;
pub mod transaction;
pub mod verify;

#[cfg(test)]
mod tests;

pub mod prelude {
    //! Re-exports of the most commonly used contract types.

    pub use crate::{
        cash::{verify_issuance, CashState},
        commands::{CashCommand, Command, CommandKind, DepositCommand},
        errors::{ContractResult, ContractViolation, TransactionError},
        settlement::{split_refund, RefundSplit},
        transaction::{
            LedgerState, LedgerTransaction, PartySignature, SignedTransaction, StateAndRef,
            TransactionBuilder, WireTransaction,
        },
        verify::verify,
    };
}
