//! The initiating side of a workflow.
//!
//! [`prepare`] locates the prior version, builds the proposal and checks it against the contract
//! without talking to anyone. [`execute`] takes the prepared proposal through context exchange,
//! signature collection and finality. Keeping the two apart lets a caller build several
//! proposals against the same prior version and race them.

use chrono::Utc;
use escrow_contract::{
    cash::CashState,
    commands::{Command, DepositCommand},
    transaction::{PartySignature, SignedTransaction, StateAndRef, TransactionBuilder},
    verify::verify,
};
use escrow_db::ledger::SubmitOutcome;
use escrow_p2p_service::Session;
use escrow_primitives::{
    deposit::DepositRecord,
    party::Party,
    types::{LinearId, StateRef, TxId},
};
use futures::future::join_all;
use secp256k1::XOnlyPublicKey;
use tracing::{debug, info, warn};

use crate::{
    config::FlowCfg,
    errors::{FlowError, FlowResult},
    handles::FlowHandles,
    messages::FlowMessage,
    progress::{FlowStep, ProgressTracker},
    proposals,
    requests::FlowRequest,
};

/// A proposal that passed the contract locally and carries the initiator's signature.
#[derive(Debug, Clone)]
pub struct PreparedFlow {
    tracker: ProgressTracker,

    linear_id: LinearId,

    txid: TxId,

    proposal: SignedTransaction,

    spent_cash: Vec<StateAndRef<CashState>>,

    successor: Option<DepositRecord>,

    participants: Vec<Party>,
}

impl PreparedFlow {
    pub const fn command(&self) -> DepositCommand {
        self.tracker.command()
    }

    pub const fn linear_id(&self) -> LinearId {
        self.linear_id
    }

    pub const fn txid(&self) -> TxId {
        self.txid
    }

    /// The proposed transaction, signed by the initiator only.
    pub const fn proposal(&self) -> &SignedTransaction {
        &self.proposal
    }

    /// The version the transaction will create, if any.
    pub const fn successor(&self) -> Option<&DepositRecord> {
        self.successor.as_ref()
    }

    pub fn history(&self) -> &[FlowStep] {
        self.tracker.history()
    }
}

/// The result of a committed workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    /// The committed transaction.
    pub txid: TxId,

    pub linear_id: LinearId,

    /// The version that is now current, or `None` once the deposit is retired.
    pub state: Option<StateAndRef<DepositRecord>>,

    /// Every step the workflow went through.
    pub history: Vec<FlowStep>,
}

/// Builds and locally verifies the proposal for `request`.
pub async fn prepare(
    handles: &FlowHandles,
    cfg: &FlowCfg,
    request: FlowRequest,
) -> FlowResult<PreparedFlow> {
    let mut tracker = ProgressTracker::new(request.command());

    match build_proposal(handles, cfg, &request, &mut tracker).await {
        Ok(prepared) => Ok(prepared),
        Err(err) => {
            tracker.fail(&err);
            Err(err)
        }
    }
}

async fn build_proposal(
    handles: &FlowHandles,
    cfg: &FlowCfg,
    request: &FlowRequest,
    tracker: &mut ProgressTracker,
) -> FlowResult<PreparedFlow> {
    let command = request.command();
    let me = handles.identity.key;

    let (prior, successor) = match request {
        FlowRequest::Create(terms) => {
            tracker.advance(FlowStep::BuildingProposal)?;

            if terms.deposit_amount.currency != cfg.currency {
                return Err(FlowError::InvalidRequest(format!(
                    "deposits are taken in {}, not {}",
                    cfg.currency, terms.deposit_amount.currency
                )));
            }

            let record = proposals::first_version(handles.identity.clone(), terms);
            tracker.set_linear_id(record.linear_id);

            (None, Some(record))
        }
        _ => {
            tracker.advance(FlowStep::LocatingPriorState)?;

            let linear_id = request.linear_id().ok_or_else(|| {
                FlowError::InvalidRequest(format!("{command} needs an existing deposit"))
            })?;
            tracker.set_linear_id(linear_id);

            let prior = handles
                .ledger
                .unconsumed_deposit(linear_id)
                .await?
                .ok_or(FlowError::NotFound(linear_id))?;
            debug!(%linear_id, state_ref = %prior.state_ref, "located prior version");

            tracker.advance(FlowStep::BuildingProposal)?;
            let successor = proposals::successor(request, &prior.state, Utc::now())?;

            (Some(prior), successor)
        }
    };

    // the parties never change, so either version identifies them
    let Some(record) = successor.as_ref().or(prior.as_ref().map(|p| &p.state)) else {
        return Err(FlowError::InvalidRequest(format!(
            "{command} has neither a prior nor a next version"
        )));
    };

    let authorized = match command.initiator() {
        Some(role) => record.party(role).key == me,
        None => record.role_of(&me).is_some(),
    };
    if !authorized {
        return Err(FlowError::Unauthorized {
            command,
            party: me,
        });
    }

    for attachment in proposals::introduced_attachments(request) {
        if !handles.attachments.contains(attachment).await? {
            return Err(FlowError::MissingAttachment(attachment));
        }
    }

    let signers = command
        .required_roles()
        .iter()
        .map(|role| record.party(*role).key);

    let mut builder = TransactionBuilder::new();
    if let Some(prior) = &prior {
        builder.add_input(prior.state_ref);
    }
    if let Some(successor) = &successor {
        builder.add_output(successor.clone());
    }
    builder.add_command(Command::deposit(command, signers));
    for attachment in proposals::referenced_attachments(record) {
        builder.add_attachment(attachment);
    }

    let spent_cash = match proposals::payments(command, record)? {
        Some(payments) => {
            handles
                .cash
                .generate_spend(&mut builder, payments.payer, &payments.payees)
                .await?
        }
        None => Vec::new(),
    };

    let tx = builder.build();

    let resolved = prior
        .iter()
        .cloned()
        .map(StateAndRef::into_ledger_state)
        .chain(spent_cash.iter().cloned().map(StateAndRef::into_ledger_state))
        .collect();
    let ledger_tx = tx.resolve(resolved)?;
    verify(&ledger_tx)?;

    let txid = ledger_tx.id;
    let signature = handles.signer.sign(&txid).await?;
    let proposal = SignedTransaction::new(tx).with_signature(signature);

    info!(%command, linear_id = %record.linear_id, %txid, "built proposal");

    Ok(PreparedFlow {
        tracker: tracker.clone(),
        linear_id: record.linear_id,
        txid,
        proposal,
        spent_cash,
        participants: record.participants().into_iter().cloned().collect(),
        successor,
    })
}

/// Collects the counterparties' signatures for `prepared` and commits it.
pub async fn execute(handles: &FlowHandles, prepared: PreparedFlow) -> FlowResult<FlowOutcome> {
    let mut tracker = prepared.tracker.clone();

    match finalize_proposal(handles, prepared, &mut tracker).await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            tracker.fail(&err);
            Err(err)
        }
    }
}

async fn finalize_proposal(
    handles: &FlowHandles,
    prepared: PreparedFlow,
    tracker: &mut ProgressTracker,
) -> FlowResult<FlowOutcome> {
    let me = handles.identity.key;
    let PreparedFlow {
        linear_id,
        txid,
        proposal,
        spent_cash,
        successor,
        participants,
        ..
    } = prepared;
    let command = tracker.command();

    let counterparties: Vec<XOnlyPublicKey> = proposal
        .tx
        .required_signers()
        .into_iter()
        .filter(|key| *key != me)
        .collect();

    let mut sessions = Vec::with_capacity(counterparties.len());
    for peer in counterparties {
        sessions.push(handles.transport.open_session(peer).await?);
    }

    if command.moves_cash() {
        tracker.advance(FlowStep::ExchangingContext)?;

        let context = FlowMessage::Context {
            states: spent_cash
                .into_iter()
                .map(StateAndRef::into_ledger_state)
                .collect(),
            identities: participants,
        };

        for session in &sessions {
            session.send(&context).await?;
        }
    }

    tracker.advance(FlowStep::CollectingSignatures)?;

    let replies = join_all(
        sessions
            .iter_mut()
            .map(|session| request_signature(session, &proposal, txid)),
    )
    .await;

    let mut signed = proposal;
    for reply in replies {
        match reply {
            Ok(signature) => signed = signed.with_signature(signature),
            Err(err) => {
                dispatch(&sessions, &aborted(&err), "abort").await;
                return Err(err);
            }
        }
    }

    tracker.advance(FlowStep::Finalizing)?;

    match handles.ledger.submit(signed.clone()).await {
        Ok(SubmitOutcome::Committed(committed)) => {
            dispatch(&sessions, &FlowMessage::Finalized(committed), "finality").await;
        }
        Ok(SubmitOutcome::Conflict {
            state_ref,
            consumed_by,
        }) => {
            let err = FlowError::ConflictingConsumption {
                state_ref,
                consumed_by,
            };
            dispatch(&sessions, &aborted(&err), "abort").await;
            return Err(err);
        }
        Err(err) => {
            let err = FlowError::from_ledger(err);
            dispatch(&sessions, &aborted(&err), "abort").await;
            return Err(err);
        }
    }

    tracker.advance(FlowStep::Done)?;
    info!(%command, %linear_id, %txid, "committed");

    let state = successor.map(|record| {
        let index = signed
            .tx
            .outputs
            .iter()
            .position(|state| state.as_deposit().is_some())
            .unwrap_or_default();

        StateAndRef::new(record, StateRef::new(txid, index as u32))
    });

    Ok(FlowOutcome {
        txid,
        linear_id,
        state,
        history: tracker.history().to_vec(),
    })
}

/// Sends the proposal to one counterparty and waits for its signature.
async fn request_signature(
    session: &mut Session,
    proposal: &SignedTransaction,
    txid: TxId,
) -> FlowResult<PartySignature> {
    let peer = session.counterparty();

    session
        .send(&FlowMessage::Proposal(proposal.clone()))
        .await?;

    match session.receive::<FlowMessage>().await? {
        FlowMessage::Signature(signature) if signature.by == peer => {
            signature.verify(&txid)?;
            debug!(%peer, %txid, "received signature");

            Ok(signature)
        }
        FlowMessage::Declined { reason } => {
            warn!(%peer, %txid, %reason, "counterparty declined");

            Err(FlowError::SignatureRejected { by: peer, reason })
        }
        other => Err(FlowError::Protocol {
            peer,
            reason: format!("expected a signature, got {other}"),
        }),
    }
}

fn aborted(err: &FlowError) -> FlowMessage {
    FlowMessage::Aborted {
        reason: err.to_string(),
    }
}

/// Tells every counterparty how the workflow ended.
///
/// Counterparties that already hung up are skipped; the outcome on the ledger stands regardless.
async fn dispatch(sessions: &[Session], msg: &FlowMessage, description: &str) {
    for session in sessions {
        if let Err(err) = session.send(msg).await {
            warn!(%description, peer = %session.counterparty(), %err, "could not notify counterparty");
        }
    }
}
