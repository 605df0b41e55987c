//! The collaborators a workflow needs to reach the outside world.

use std::{fmt, sync::Arc};

use escrow_db::{attachments::AttachmentStore, ledger::LedgerStore};
use escrow_p2p_service::SessionTransport;
use escrow_primitives::party::Party;

use crate::{cash::MoneyMovement, identities::IdentityDirectory, signing::SignatureService};

/// The handles for the services a node's workflows use.
///
/// If this needs to be shared across multiple workflows, it should be wrapped in an [`Arc`].
pub struct FlowHandles {
    /// The party this node acts for.
    pub identity: Party,

    /// Signs on behalf of [`FlowHandles::identity`].
    pub signer: Arc<dyn SignatureService>,

    /// The shared ledger.
    pub ledger: Arc<dyn LedgerStore>,

    /// Selects and moves this party's cash.
    pub cash: Arc<dyn MoneyMovement>,

    /// Inventories and evidence.
    pub attachments: Arc<dyn AttachmentStore>,

    /// Sessions with the other parties.
    pub transport: Arc<dyn SessionTransport>,

    /// The parties this node knows.
    pub identities: IdentityDirectory,
}

impl fmt::Debug for FlowHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowHandles")
            .field("identity", &self.identity)
            .field("identities", &self.identities)
            .finish_non_exhaustive()
    }
}
