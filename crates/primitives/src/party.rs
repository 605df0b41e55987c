//! The identities taking part in a deposit.

use std::fmt;

use secp256k1::XOnlyPublicKey;
use serde::{Deserialize, Serialize};

/// A well-known ledger identity: a human readable name bound to a signing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// The legal name of the party, e.g. `O=Landlord,L=London,C=GB`.
    pub name: String,
    /// The key the party signs transactions with.
    pub key: XOnlyPublicKey,
}

impl Party {
    /// Creates a new party.
    pub fn new(name: impl Into<String>, key: XOnlyPublicKey) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The role a party plays with respect to a single deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The party letting the property and claiming deductions.
    Landlord,
    /// The party paying the deposit and receiving the refund.
    Tenant,
    /// The deposit backing scheme holding the money and arbitrating disputes.
    Issuer,
}

impl Role {
    /// All roles, in a stable order.
    pub const ALL: [Role; 3] = [Role::Landlord, Role::Tenant, Role::Issuer];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role_str = match self {
            Role::Landlord => "landlord",
            Role::Tenant => "tenant",
            Role::Issuer => "issuer",
        };
        write!(f, "{}", role_str)
    }
}
