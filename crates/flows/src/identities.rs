//! The well-known identities a node is prepared to deal with.

use std::{collections::HashMap, sync::Arc};

use escrow_primitives::party::Party;
use secp256k1::XOnlyPublicKey;
use tokio::sync::RwLock;
use tracing::debug;

/// Maps keys to the parties they belong to.
///
/// A responder only signs transactions whose every key it can attribute to a known party.
#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
    /// key -> party
    parties: Arc<RwLock<HashMap<XOnlyPublicKey, Party>>>,
}

impl IdentityDirectory {
    /// Creates a directory that knows `parties`.
    pub fn new(parties: impl IntoIterator<Item = Party>) -> Self {
        let parties = parties.into_iter().map(|p| (p.key, p)).collect();

        Self {
            parties: Arc::new(RwLock::new(parties)),
        }
    }

    /// Learns `party`. A later registration of the same key replaces the earlier one.
    pub async fn register(&self, party: Party) {
        debug!(%party, key = %party.key, "registered identity");
        self.parties.write().await.insert(party.key, party);
    }

    /// Returns the party behind `key`, if known.
    pub async fn well_known(&self, key: &XOnlyPublicKey) -> Option<Party> {
        self.parties.read().await.get(key).cloned()
    }

    /// Returns the first key in `keys` that belongs to no known party.
    pub async fn first_unknown(
        &self,
        keys: impl IntoIterator<Item = XOnlyPublicKey>,
    ) -> Option<XOnlyPublicKey> {
        let parties = self.parties.read().await;

        keys.into_iter().find(|key| !parties.contains_key(key))
    }
}
