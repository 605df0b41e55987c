//! Parties and signing keys.

use escrow_primitives::party::{Party, Role};
use secp256k1::{Keypair, XOnlyPublicKey, SECP256K1};

/// Generates a random keypair.
pub fn generate_keypair() -> Keypair {
    Keypair::new(SECP256K1, &mut rand::thread_rng())
}

/// Generates a random x-only public key that nobody in a test holds the secret for.
pub fn generate_xonly_pubkey() -> XOnlyPublicKey {
    generate_keypair().x_only_public_key().0
}

/// A ledger identity together with the keypair it signs with.
#[derive(Debug, Clone)]
pub struct TestParty {
    /// The public identity.
    pub party: Party,
    /// The signing keypair backing [`TestParty::party`].
    pub keypair: Keypair,
}

impl TestParty {
    /// Generates a party with a fresh key.
    pub fn generate(name: &str) -> Self {
        let keypair = generate_keypair();
        let party = Party::new(name, keypair.x_only_public_key().0);

        Self { party, keypair }
    }

    /// The party's public key.
    pub fn key(&self) -> XOnlyPublicKey {
        self.party.key
    }
}

/// The three participants of a deposit.
#[derive(Debug, Clone)]
pub struct Cast {
    /// The landlord.
    pub landlord: TestParty,
    /// The tenant.
    pub tenant: TestParty,
    /// The deposit scheme.
    pub issuer: TestParty,
}

impl Cast {
    /// Generates three distinct parties.
    pub fn generate() -> Self {
        Self {
            landlord: TestParty::generate("O=Landlord,L=London,C=GB"),
            tenant: TestParty::generate("O=Tenant,L=London,C=GB"),
            issuer: TestParty::generate("O=DepositScheme,L=London,C=GB"),
        }
    }

    /// Returns the participant playing `role`.
    pub const fn get(&self, role: Role) -> &TestParty {
        match role {
            Role::Landlord => &self.landlord,
            Role::Tenant => &self.tenant,
            Role::Issuer => &self.issuer,
        }
    }
}
