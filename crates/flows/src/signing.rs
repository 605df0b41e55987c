//! Access to a party's signing key.

use async_trait::async_trait;
use escrow_contract::transaction::PartySignature;
use escrow_primitives::types::TxId;
use secp256k1::{Keypair, XOnlyPublicKey};

use crate::errors::FlowResult;

/// Signs transaction ids on behalf of one party.
///
/// The key itself may live elsewhere; workflows only ever see signatures.
#[async_trait]
pub trait SignatureService: Send + Sync {
    /// The key signatures are made with.
    fn public_key(&self) -> XOnlyPublicKey;

    /// Signs `txid`.
    async fn sign(&self, txid: &TxId) -> FlowResult<PartySignature>;
}

/// A [`SignatureService`] holding the key in memory.
#[derive(Debug, Clone)]
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub const fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl SignatureService for KeypairSigner {
    fn public_key(&self) -> XOnlyPublicKey {
        self.keypair.x_only_public_key().0
    }

    async fn sign(&self, txid: &TxId) -> FlowResult<PartySignature> {
        Ok(PartySignature::sign(txid, &self.keypair))
    }
}
