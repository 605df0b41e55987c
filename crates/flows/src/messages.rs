//! What initiators and responders say to each other within a session.

use std::fmt;

use escrow_contract::transaction::{PartySignature, SignedTransaction, StateAndRef};
use escrow_primitives::{party::Party, types::TxId};
use serde::{Deserialize, Serialize};

/// A message exchanged within a workflow session.
///
/// A session runs `Context?`, `Proposal`, then `Signature` or `Declined` from the responder,
/// and finally `Finalized` or `Aborted` from the initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowMessage {
    /// States the responder cannot look up by itself and the identities behind every key the
    /// upcoming proposal refers to.
    Context {
        /// The states being spent, typically cash.
        states: Vec<StateAndRef>,
        /// The well-known identities vouched for by the initiator.
        identities: Vec<Party>,
    },

    /// The transaction to sign, already signed by the initiator.
    Proposal(SignedTransaction),

    /// The responder's signature over the proposal.
    Signature(PartySignature),

    /// The responder refuses to sign.
    Declined {
        /// Why.
        reason: String,
    },

    /// The proposal was committed under this id.
    Finalized(TxId),

    /// The proposal will not be committed.
    Aborted {
        /// Why.
        reason: String,
    },
}

impl fmt::Display for FlowMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg_str = match self {
            FlowMessage::Context { .. } => "context",
            FlowMessage::Proposal(_) => "proposal",
            FlowMessage::Signature(_) => "signature",
            FlowMessage::Declined { .. } => "declined",
            FlowMessage::Finalized(_) => "finalized",
            FlowMessage::Aborted { .. } => "aborted",
        };
        write!(f, "{}", msg_str)
    }
}
