//! The workflows that move a deposit through its lifecycle.
//!
//! Every step runs as an interactive protocol between the initiating party and each required
//! co-signer: locate the prior version, build the proposal, exchange context, collect signatures
//! and finalize. Counterparties run the same contract before they sign, so nothing reaches the
//! ledger that any of them would reject.

pub mod cash;
pub mod config;
pub mod errors;
pub mod handles;
pub mod identities;
pub mod initiator;
pub mod messages;
pub mod node;
pub mod progress;
pub mod proposals;
pub mod requests;
pub mod responder;
pub mod signing;

pub mod prelude {
    //! Re-exports of everything needed to run a node.

    pub use crate::{
        cash::{LedgerCash, MoneyMovement},
        config::{FlowCfg, SigningPolicy},
        errors::{FlowError, FlowResult},
        handles::FlowHandles,
        identities::IdentityDirectory,
        initiator::{FlowOutcome, PreparedFlow},
        messages::FlowMessage,
        node::EscrowNode,
        progress::{FlowStep, ProgressTracker},
        requests::{FlowRequest, NewDeposit},
        responder::ResponderOutcome,
        signing::{KeypairSigner, SignatureService},
    };
}
