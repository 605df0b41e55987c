//! One party's view of the escrow: the initiator API for every lifecycle step and the loop
//! answering everybody else's proposals.

use std::sync::Arc;

use escrow_contract::transaction::StateAndRef;
use escrow_p2p_service::{Inbox, Session};
use escrow_primitives::{
    deduction::{ArbitratorDeduction, Deduction},
    deposit::DepositRecord,
    money::Money,
    party::Party,
    types::LinearId,
};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    config::FlowCfg,
    errors::FlowResult,
    handles::FlowHandles,
    initiator::{self, FlowOutcome, PreparedFlow},
    requests::{FlowRequest, NewDeposit},
    responder::{self, ResponderOutcome},
};

/// A party's node.
///
/// Cloning is cheap: every clone shares the same handles and configuration.
#[derive(Debug, Clone)]
pub struct EscrowNode {
    handles: Arc<FlowHandles>,

    cfg: Arc<FlowCfg>,
}

impl EscrowNode {
    pub fn new(handles: FlowHandles, cfg: Arc<FlowCfg>) -> Self {
        Self {
            handles: Arc::new(handles),
            cfg,
        }
    }

    /// The party this node acts for.
    pub fn identity(&self) -> &Party {
        &self.handles.identity
    }

    pub fn handles(&self) -> &FlowHandles {
        &self.handles
    }

    pub fn cfg(&self) -> &FlowCfg {
        &self.cfg
    }

    /// Builds and locally verifies the proposal for `request` without contacting anyone.
    pub async fn prepare(&self, request: FlowRequest) -> FlowResult<PreparedFlow> {
        initiator::prepare(&self.handles, &self.cfg, request).await
    }

    /// Takes a prepared proposal through signature collection and finality.
    pub async fn execute(&self, prepared: PreparedFlow) -> FlowResult<FlowOutcome> {
        initiator::execute(&self.handles, prepared).await
    }

    /// Runs the whole workflow for `request`.
    pub async fn run(&self, request: FlowRequest) -> FlowResult<FlowOutcome> {
        let prepared = self.prepare(request).await?;
        self.execute(prepared).await
    }

    /// Proposes a new deposit with this node as the landlord.
    pub async fn create(&self, terms: NewDeposit) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::Create(terms)).await
    }

    pub async fn cosign(&self, linear_id: LinearId) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::CoSign { linear_id }).await
    }

    pub async fn fund(&self, linear_id: LinearId) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::Fund { linear_id }).await
    }

    pub async fn landlord_deduct(
        &self,
        linear_id: LinearId,
        deductions: Vec<Deduction>,
    ) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::LandlordDeduct {
            linear_id,
            deductions,
        })
        .await
    }

    pub async fn tenant_deduct(
        &self,
        linear_id: LinearId,
        deductions: Vec<Deduction>,
    ) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::TenantDeduct {
            linear_id,
            deductions,
        })
        .await
    }

    pub async fn accept_deductions(&self, linear_id: LinearId) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::AcceptDeductions { linear_id }).await
    }

    pub async fn request_refund(&self, linear_id: LinearId) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::RequestRefund { linear_id }).await
    }

    pub async fn refund(&self, linear_id: LinearId) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::Refund { linear_id }).await
    }

    pub async fn arbitrate(
        &self,
        linear_id: LinearId,
        rulings: Vec<ArbitratorDeduction>,
    ) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::Arbitrate { linear_id, rulings })
            .await
    }

    pub async fn exit(&self, linear_id: LinearId) -> FlowResult<FlowOutcome> {
        self.run(FlowRequest::Exit { linear_id }).await
    }

    /// Answers a single incoming session.
    pub async fn respond(&self, session: Session) -> FlowResult<ResponderOutcome> {
        responder::respond(&self.handles, &self.cfg, session).await
    }

    /// Answers every session arriving in `inbox`, each in its own task, until the inbox closes.
    pub fn spawn_responder(&self, mut inbox: Inbox) -> JoinHandle<()> {
        let node = self.clone();

        tokio::spawn(async move {
            info!(party = %node.identity(), "responder started");

            while let Some(session) = inbox.accept().await {
                let node = node.clone();

                tokio::spawn(async move {
                    let peer = session.counterparty();
                    let id = session.id();

                    match node.respond(session).await {
                        Ok(outcome) => info!(session = %id, %peer, ?outcome, "responder finished"),
                        Err(err) => error!(session = %id, %peer, %err, "responder failed"),
                    }
                });
            }

            warn!(party = %node.identity(), "inbox closed, responder stopped");
        })
    }

    /// The current version of every deposit this party takes part in.
    pub async fn deposits(&self) -> FlowResult<Vec<StateAndRef<DepositRecord>>> {
        Ok(self
            .handles
            .ledger
            .deposits_for(self.handles.identity.key)
            .await?)
    }

    /// The cash this party holds in the configured currency.
    pub async fn balance(&self) -> FlowResult<Money> {
        Ok(self
            .handles
            .ledger
            .cash_balance(self.handles.identity.key, self.cfg.currency)
            .await?)
    }
}
