//! This crate contains the general types and pure functions shared across the escrow workspace:
//! parties, money, attachment references, deductions and the deposit record itself.
//!
//! It lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace.

pub mod attachment;
pub mod deduction;
pub mod deposit;
pub mod errors;
pub mod money;
pub mod party;
pub mod types;

pub mod prelude {
    //! Re-exports of the most commonly used types.

    pub use crate::{
        attachment::AttachmentRef,
        deduction::{ArbitratorDeduction, Deduction, DeductionField},
        deposit::{DepositField, DepositRecord},
        errors::MoneyError,
        money::{Currency, Money},
        party::{Party, Role},
        types::{LinearId, StateRef, Timestamp, TxId},
    };
}
