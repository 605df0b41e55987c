//! The responding side of a workflow.
//!
//! The responder knows nothing about individual lifecycle steps. It resolves the proposal,
//! checks who is asking and who is involved, re-runs the contract and signs if everything holds.

use std::collections::BTreeSet;

use escrow_contract::{
    commands::DepositCommand,
    errors::{ContractViolation, TransactionError},
    transaction::{LedgerTransaction, SignedTransaction, StateAndRef},
    verify::verify,
};
use escrow_db::errors::DbError;
use escrow_p2p_service::Session;
use escrow_primitives::types::{LinearId, StateRef, TxId};
use secp256k1::XOnlyPublicKey;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::{FlowCfg, SigningPolicy},
    errors::{FlowError, FlowResult},
    handles::FlowHandles,
    messages::FlowMessage,
};

/// How a responder session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderOutcome {
    /// The proposal was signed and committed.
    Finalized(TxId),

    /// The responder refused to sign.
    Declined {
        /// The proposal.
        txid: TxId,
        /// Why it was refused.
        reason: String,
    },

    /// The initiator gave up.
    Aborted {
        /// Why.
        reason: String,
    },
}

/// Reasons to refuse a proposal.
#[derive(Debug, Error)]
enum Decline {
    #[error("signing policy declines every proposal")]
    Policy,

    #[error("not a required signer")]
    NotRequired,

    #[error("proposal carries no deposit command")]
    NoDepositCommand,

    #[error("proposal is not signed by its initiator")]
    UnsignedByInitiator,

    #[error("{peer} may not start {command}")]
    WrongInitiator {
        peer: XOnlyPublicKey,
        command: DepositCommand,
    },

    #[error("{0} is not a known identity")]
    UnknownIdentity(XOnlyPublicKey),

    #[error("input {0} cannot be resolved")]
    UnresolvedInput(StateRef),

    #[error("deposit {0} already exists")]
    DepositExists(LinearId),

    #[error("contract: {0}")]
    Contract(#[from] ContractViolation),

    #[error("transaction: {0}")]
    Transaction(#[from] TransactionError),

    #[error("ledger: {0}")]
    Ledger(#[from] DbError),
}

/// Answers the proposal arriving on `session`.
pub async fn respond(
    handles: &FlowHandles,
    cfg: &FlowCfg,
    mut session: Session,
) -> FlowResult<ResponderOutcome> {
    let peer = session.counterparty();
    let mut context = Vec::new();

    let proposal = loop {
        match session.receive::<FlowMessage>().await? {
            FlowMessage::Context { states, identities } => {
                debug!(%peer, states = states.len(), identities = identities.len(), "received context");

                // only parties we already know may vouch for others
                if handles.identities.well_known(&peer).await.is_some() {
                    for party in identities {
                        handles.identities.register(party).await;
                    }
                }
                context.extend(states);
            }
            FlowMessage::Proposal(proposal) => break proposal,
            FlowMessage::Aborted { reason } => return Ok(ResponderOutcome::Aborted { reason }),
            other => {
                return Err(FlowError::Protocol {
                    peer,
                    reason: format!("expected a proposal, got {other}"),
                })
            }
        }
    };

    let txid = proposal.id()?;

    if let Err(decline) = check_proposal(handles, cfg, peer, &proposal, context).await {
        let reason = decline.to_string();
        warn!(%peer, %txid, %reason, "declining proposal");

        session
            .send(&FlowMessage::Declined {
                reason: reason.clone(),
            })
            .await?;

        return Ok(ResponderOutcome::Declined { txid, reason });
    }

    let signature = handles.signer.sign(&txid).await?;
    session.send(&FlowMessage::Signature(signature)).await?;
    info!(%peer, %txid, "signed proposal");

    match session.receive::<FlowMessage>().await? {
        FlowMessage::Finalized(committed) if committed == txid => {
            info!(%peer, %txid, "proposal committed");
            Ok(ResponderOutcome::Finalized(txid))
        }
        FlowMessage::Aborted { reason } => {
            info!(%peer, %txid, %reason, "proposal aborted");
            Ok(ResponderOutcome::Aborted { reason })
        }
        other => Err(FlowError::Protocol {
            peer,
            reason: format!("expected the outcome of {txid}, got {other}"),
        }),
    }
}

async fn check_proposal(
    handles: &FlowHandles,
    cfg: &FlowCfg,
    peer: XOnlyPublicKey,
    proposal: &SignedTransaction,
    context: Vec<StateAndRef>,
) -> Result<(), Decline> {
    if cfg.signing_policy == SigningPolicy::DeclineAll {
        return Err(Decline::Policy);
    }

    let me = handles.signer.public_key();
    if !proposal.tx.required_signers().contains(&me) {
        return Err(Decline::NotRequired);
    }

    let Some(command) = proposal.tx.commands.iter().find_map(|c| c.as_deposit()) else {
        return Err(Decline::NoDepositCommand);
    };

    proposal.verify_present_signatures()?;
    if !proposal.signed_by().contains(&peer) {
        return Err(Decline::UnsignedByInitiator);
    }

    let ledger_tx = resolve(handles, proposal, context).await?;

    let Some(record) = ledger_tx
        .deposit_outputs()
        .into_iter()
        .chain(ledger_tx.deposit_inputs())
        .next()
    else {
        return Err(Decline::NoDepositCommand);
    };

    let initiated_by_role = match command.initiator() {
        Some(role) => record.party(role).key == peer,
        None => record.role_of(&peer).is_some(),
    };
    if !initiated_by_role {
        return Err(Decline::WrongInitiator { peer, command });
    }

    if let Some(unknown) = handles
        .identities
        .first_unknown(referenced_keys(&ledger_tx))
        .await
    {
        return Err(Decline::UnknownIdentity(unknown));
    }

    verify(&ledger_tx)?;

    // a new version must consume the current one
    for output in ledger_tx.deposit_outputs() {
        let history = handles.ledger.history(output.linear_id).await?;
        if history
            .last()
            .is_some_and(|current| !proposal.tx.inputs.contains(&current.state_ref))
        {
            return Err(Decline::DepositExists(output.linear_id));
        }
    }

    Ok(())
}

/// Resolves the inputs of `proposal`, preferring the ledger over what the initiator sent.
async fn resolve(
    handles: &FlowHandles,
    proposal: &SignedTransaction,
    context: Vec<StateAndRef>,
) -> Result<LedgerTransaction, Decline> {
    let mut resolved = Vec::with_capacity(proposal.tx.inputs.len());

    for input in &proposal.tx.inputs {
        let state = match handles.ledger.state(*input).await? {
            Some(state) => state,
            None => context
                .iter()
                .find(|s| &s.state_ref == input)
                .map(|s| s.state.clone())
                .ok_or(Decline::UnresolvedInput(*input))?,
        };
        resolved.push(StateAndRef::new(state, *input));
    }

    Ok(proposal.tx.resolve(resolved)?)
}

/// Every key a transaction mentions: signers, cash owners and deposit parties.
fn referenced_keys(tx: &LedgerTransaction) -> BTreeSet<XOnlyPublicKey> {
    let signers = tx.commands.iter().flat_map(|c| c.signers.iter().copied());
    let holders = tx
        .inputs
        .iter()
        .map(|input| &input.state)
        .chain(tx.outputs.iter())
        .flat_map(|state| state.participants());

    signers.chain(holders).collect()
}
