use std::time::Duration;

use secp256k1::XOnlyPublicKey;
use thiserror::Error;

/// Errors raised by the session layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nobody is listening under the key.
    #[error("unknown peer {0}")]
    UnknownPeer(XOnlyPublicKey),

    /// The key is already registered with the network.
    #[error("peer {0} is already registered")]
    AlreadyRegistered(XOnlyPublicKey),

    /// The counterparty did not answer in time.
    #[error("no message from {peer} within {after:?}")]
    Timeout {
        /// The silent counterparty.
        peer: XOnlyPublicKey,
        /// How long we waited.
        after: Duration,
    },

    /// The counterparty went away.
    #[error("session with {0} closed")]
    Closed(XOnlyPublicKey),

    /// A message could not be encoded or decoded.
    #[error("codec: {0}")]
    Codec(#[from] bincode::Error),
}

/// The result type for session operations.
pub type TransportResult<T> = Result<T, TransportError>;
