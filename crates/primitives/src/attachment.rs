//! Content-addressed references to off-ledger blobs such as inventories and evidence photos.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::ParseIdError;

/// The sha256 digest of an attachment's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttachmentRef([u8; 32]);

impl AttachmentRef {
    /// Computes the reference of the given content.
    pub fn of(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    /// Returns the raw digest.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for AttachmentRef {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for AttachmentRef {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;

        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_depends_only_on_content() {
        assert_eq!(AttachmentRef::of(b"inventory"), AttachmentRef::of(b"inventory"));
        assert_ne!(AttachmentRef::of(b"inventory"), AttachmentRef::of(b"inventory2"));
    }

    #[test]
    fn display_is_hex_sha256() {
        // sha256("")
        assert_eq!(
            AttachmentRef::of(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
