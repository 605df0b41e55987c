//! Wires three parties together in-process and takes one deposit from creation to exit.

use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Context};
use escrow_db::prelude::*;
use escrow_flows::prelude::*;
use escrow_p2p_service::{Configuration, InMemoryNetwork};
use escrow_params::prelude::EscrowParams;
use escrow_primitives::{
    deduction::Deduction,
    party::{Party, Role},
};
use secp256k1::{Keypair, SECP256K1};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{Config, ScenarioConfig};

/// The nodes of all three parties, sharing one ledger and one network.
#[derive(Debug)]
struct Parties {
    ledger: InMemoryLedger,

    keys: HashMap<Role, Keypair>,

    nodes: HashMap<Role, EscrowNode>,

    responders: Vec<JoinHandle<()>>,
}

impl Parties {
    fn node(&self, role: Role) -> anyhow::Result<&EscrowNode> {
        self.nodes
            .get(&role)
            .with_context(|| format!("no node for the {role}"))
    }

    fn key(&self, role: Role) -> anyhow::Result<&Keypair> {
        self.keys
            .get(&role)
            .with_context(|| format!("no key for the {role}"))
    }
}

impl Drop for Parties {
    fn drop(&mut self) {
        for responder in &self.responders {
            responder.abort();
        }
    }
}

fn legal_name(role: Role) -> &'static str {
    match role {
        Role::Landlord => "O=Landlord,L=London,C=GB",
        Role::Tenant => "O=Tenant,L=London,C=GB",
        Role::Issuer => "O=Deposit Protection Scheme,L=London,C=GB",
    }
}

async fn start_parties(params: &EscrowParams, config: &Config) -> anyhow::Result<Parties> {
    let network = InMemoryNetwork::new(Configuration {
        receive_timeout: config.session.receive_timeout,
        channel_capacity: config.session.channel_capacity,
    });
    let cfg = Arc::new(FlowCfg {
        currency: params.currency,
        ..FlowCfg::default()
    });

    let keys = Role::ALL
        .into_iter()
        .map(|role| (role, Keypair::new(SECP256K1, &mut rand::thread_rng())))
        .collect::<HashMap<_, _>>();
    let directory = keys
        .iter()
        .map(|(role, keypair)| {
            (
                *role,
                Party::new(legal_name(*role), keypair.x_only_public_key().0),
            )
        })
        .collect::<HashMap<_, _>>();
    let ledger =
        InMemoryLedger::with_cash_issuers(directory.get(&Role::Issuer).map(|issuer| issuer.key));

    let mut nodes = HashMap::new();
    let mut responders = Vec::new();

    for (role, party) in &directory {
        let keypair = keys[role];
        let (transport, inbox) = network.register(party.key).await?;

        let attachments = FsAttachmentStore::open(config.datadir.join(role.to_string()))
            .await
            .with_context(|| format!("could not open the {role}'s attachment store"))?;

        let ledger_handle: Arc<dyn LedgerStore> = Arc::new(ledger.clone());
        let handles = FlowHandles {
            identity: party.clone(),
            signer: Arc::new(KeypairSigner::new(keypair)),
            ledger: ledger_handle.clone(),
            cash: Arc::new(LedgerCash::new(ledger_handle)),
            attachments: Arc::new(attachments),
            transport: Arc::new(transport),
            identities: IdentityDirectory::new(directory.values().cloned()),
        };

        let node = EscrowNode::new(handles, cfg.clone());
        responders.push(node.spawn_responder(inbox));

        info!(%role, party = %party, "party started");
        nodes.insert(*role, node);
    }

    Ok(Parties {
        ledger,
        keys,
        nodes,
        responders,
    })
}

/// Runs the configured deposit through its lifecycle and logs every version committed.
pub(crate) async fn run(params: EscrowParams, config: Config) -> anyhow::Result<()> {
    params.validate()?;

    let ScenarioConfig {
        property_id,
        deposit,
        landlord_claim,
        tenant_offer,
    } = &config.scenario;

    if tenant_offer > landlord_claim || landlord_claim > deposit {
        bail!("the tenant's offer must not exceed the claim, nor the claim the deposit");
    }

    let deposit = params.major(*deposit)?;
    let claim = params.major(*landlord_claim)?;
    let offer = params.major(*tenant_offer)?;

    let parties = start_parties(&params, &config).await?;
    let landlord = parties.node(Role::Landlord)?;
    let tenant = parties.node(Role::Tenant)?;
    let issuer = parties.node(Role::Issuer)?;

    parties
        .ledger
        .issue_cash(parties.key(Role::Issuer)?, tenant.identity().key, deposit)
        .await?;
    info!(%deposit, "issued cash to the tenant");

    let inventory = landlord
        .handles()
        .attachments
        .save(format!("inventory of {property_id}").into_bytes())
        .await?;

    let created = landlord
        .create(NewDeposit {
            tenant: tenant.identity().clone(),
            issuer: issuer.identity().clone(),
            property_id: property_id.clone(),
            deposit_amount: deposit,
            inventory,
        })
        .await?;
    let linear_id = created.linear_id;
    info!(%linear_id, txid = %created.txid, "deposit created");

    let funded = tenant.fund(linear_id).await?;
    info!(%linear_id, txid = %funded.txid, "deposit funded");

    let evidence = landlord
        .handles()
        .attachments
        .save(b"photograph of the stained carpet".to_vec())
        .await?;
    let carpet = Deduction::new("carpet cleaning", claim, evidence);

    let claimed = landlord
        .landlord_deduct(linear_id, vec![carpet.clone()])
        .await?;
    info!(%linear_id, txid = %claimed.txid, %claim, "landlord claimed deductions");

    let offered = tenant
        .tenant_deduct(linear_id, vec![carpet.with_amount(offer)])
        .await?;
    info!(%linear_id, txid = %offered.txid, %offer, "tenant answered the claim");

    let settled = offered
        .state
        .as_ref()
        .is_some_and(|current| current.state.accepted_deductions.is_some());
    if !settled {
        let accepted = landlord.accept_deductions(linear_id).await?;
        info!(%linear_id, txid = %accepted.txid, "landlord accepted the offer");
    }

    let refunded = issuer.refund(linear_id).await?;
    info!(%linear_id, txid = %refunded.txid, "deposit refunded");

    for role in Role::ALL {
        let balance = parties.node(role)?.balance().await?;
        info!(%role, %balance, "final balance");
    }

    let exited = issuer.exit(linear_id).await?;
    info!(%linear_id, txid = %exited.txid, "deposit retired");

    let history = parties.ledger.history(linear_id).await?;
    info!(%linear_id, versions = history.len(), "lifecycle complete");

    Ok(())
}
