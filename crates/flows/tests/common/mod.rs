//! A three-party network over a shared in-memory ledger.

#![allow(dead_code, unreachable_pub)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use escrow_db::prelude::*;
use escrow_flows::prelude::*;
use escrow_p2p_service::{Configuration, InMemoryNetwork, Inbox};
use escrow_primitives::{deduction::Deduction, money::Money, party::Role, types::LinearId};
use escrow_test_utils::prelude::*;
use tokio::task::JoinHandle;

/// Knobs for a [`Scenario`].
#[derive(Debug, Clone)]
pub struct Options {
    /// A party that refuses to co-sign anything.
    pub declining: Option<Role>,

    /// A party that joins the network but never answers.
    pub silent: Option<Role>,

    /// Whether the tenant knows who the issuer is.
    pub tenant_knows_issuer: bool,

    pub receive_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            declining: None,
            silent: None,
            tenant_knows_issuer: true,
            receive_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct Scenario {
    pub cast: Cast,

    pub ledger: InMemoryLedger,

    pub network: InMemoryNetwork,

    nodes: HashMap<Role, EscrowNode>,

    /// inboxes of silent parties
    pub inboxes: HashMap<Role, Inbox>,

    responders: Vec<JoinHandle<()>>,
}

impl Drop for Scenario {
    fn drop(&mut self) {
        for responder in &self.responders {
            responder.abort();
        }
    }
}

impl Scenario {
    pub async fn new() -> Self {
        Self::with_options(Options::default()).await
    }

    pub async fn with_options(options: Options) -> Self {
        let cast = Cast::generate();
        let ledger = InMemoryLedger::with_cash_issuers([cast.issuer.key()]);
        let network = InMemoryNetwork::new(
            Configuration::default().with_receive_timeout(options.receive_timeout),
        );

        let mut nodes = HashMap::new();
        let mut inboxes = HashMap::new();
        let mut responders = Vec::new();

        for role in Role::ALL {
            let me = cast.get(role);
            let (transport, inbox) = network.register(me.key()).await.unwrap();

            let hidden = (!options.tenant_knows_issuer && role == Role::Tenant)
                .then_some(Role::Issuer);
            let known = Role::ALL
                .into_iter()
                .filter(|other| Some(*other) != hidden)
                .map(|other| cast.get(other).party.clone());

            let ledger_handle: Arc<dyn LedgerStore> = Arc::new(ledger.clone());
            let handles = FlowHandles {
                identity: me.party.clone(),
                signer: Arc::new(KeypairSigner::new(me.keypair)),
                ledger: ledger_handle.clone(),
                cash: Arc::new(LedgerCash::new(ledger_handle)),
                attachments: Arc::new(InMemoryAttachmentStore::default()),
                transport: Arc::new(transport),
                identities: IdentityDirectory::new(known),
            };

            let signing_policy = if options.declining == Some(role) {
                SigningPolicy::DeclineAll
            } else {
                SigningPolicy::ContractOnly
            };
            let cfg = Arc::new(FlowCfg {
                signing_policy,
                ..FlowCfg::default()
            });

            let node = EscrowNode::new(handles, cfg);

            if options.silent == Some(role) {
                inboxes.insert(role, inbox);
            } else {
                responders.push(node.spawn_responder(inbox));
            }

            nodes.insert(role, node);
        }

        Self {
            cast,
            ledger,
            network,
            nodes,
            inboxes,
            responders,
        }
    }

    pub fn node(&self, role: Role) -> &EscrowNode {
        &self.nodes[&role]
    }

    pub fn landlord(&self) -> &EscrowNode {
        self.node(Role::Landlord)
    }

    pub fn tenant(&self) -> &EscrowNode {
        self.node(Role::Tenant)
    }

    pub fn issuer(&self) -> &EscrowNode {
        self.node(Role::Issuer)
    }

    /// Gives the tenant enough cash to pay the deposit.
    pub async fn pay_tenant(&self, amount: Money) {
        self.ledger
            .issue_cash(&self.cast.issuer.keypair, self.cast.tenant.key(), amount)
            .await
            .unwrap();
    }

    /// The terms of a £1000 deposit whose inventory the landlord holds.
    pub async fn terms(&self) -> NewDeposit {
        let inventory = self
            .landlord()
            .handles()
            .attachments
            .save(b"inventory: one carpet, cream".to_vec())
            .await
            .unwrap();

        NewDeposit {
            tenant: self.cast.tenant.party.clone(),
            issuer: self.cast.issuer.party.clone(),
            property_id: "12 Acacia Avenue".to_string(),
            deposit_amount: pounds(TEST_DEPOSIT_POUNDS),
            inventory,
        }
    }

    /// Creates a £1000 deposit and returns its id.
    pub async fn created(&self) -> LinearId {
        let terms = self.terms().await;

        self.landlord().create(terms).await.unwrap().linear_id
    }

    /// Creates and funds a £1000 deposit and returns its id.
    pub async fn funded(&self) -> LinearId {
        let linear_id = self.created().await;
        self.pay_tenant(pounds(TEST_DEPOSIT_POUNDS)).await;
        self.tenant().fund(linear_id).await.unwrap();

        linear_id
    }

    /// Stores the evidence for a deduction with the landlord and returns the deduction.
    pub async fn evidence(&self, reason: &str, amount: Money) -> Deduction {
        self.landlord()
            .handles()
            .attachments
            .save(reason.as_bytes().to_vec())
            .await
            .unwrap();

        deduction(reason, amount)
    }

    pub async fn balance(&self, role: Role) -> Money {
        self.node(role).balance().await.unwrap()
    }
}
