//! A conversation with a single counterparty.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use secp256k1::XOnlyPublicKey;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use crate::errors::{TransportError, TransportResult};

/// Identifies a session. Both ends share the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Opens sessions on behalf of one party.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// The key of the party this transport speaks for.
    fn local(&self) -> XOnlyPublicKey;

    /// Opens a new session with `peer`.
    async fn open_session(&self, peer: XOnlyPublicKey) -> TransportResult<Session>;
}

/// One end of an ordered, bidirectional channel to a counterparty.
///
/// Messages are delivered in the order they were sent. Dropping either end closes the session
/// for the other.
#[derive(Debug)]
pub struct Session {
    id: SessionId,

    local: XOnlyPublicKey,

    peer: XOnlyPublicKey,

    outbound: mpsc::Sender<Vec<u8>>,

    inbound: mpsc::Receiver<Vec<u8>>,

    receive_timeout: Duration,
}

impl Session {
    /// Creates both ends of a session between `initiator` and `responder`.
    pub(crate) fn pair(
        id: SessionId,
        initiator: XOnlyPublicKey,
        responder: XOnlyPublicKey,
        capacity: usize,
        receive_timeout: Duration,
    ) -> (Self, Self) {
        let (to_responder, from_initiator) = mpsc::channel(capacity);
        let (to_initiator, from_responder) = mpsc::channel(capacity);

        let initiator_end = Self {
            id,
            local: initiator,
            peer: responder,
            outbound: to_responder,
            inbound: from_responder,
            receive_timeout,
        };
        let responder_end = Self {
            id,
            local: responder,
            peer: initiator,
            outbound: to_initiator,
            inbound: from_initiator,
            receive_timeout,
        };

        (initiator_end, responder_end)
    }

    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The key of the party on this end.
    pub const fn local(&self) -> XOnlyPublicKey {
        self.local
    }

    /// The key of the party on the other end.
    pub const fn counterparty(&self) -> XOnlyPublicKey {
        self.peer
    }

    pub const fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    /// Sends `msg` to the counterparty.
    pub async fn send<T>(&self, msg: &T) -> TransportResult<()>
    where
        T: Serialize + fmt::Debug + Sync,
    {
        trace!(session = %self.id, peer = %self.peer, ?msg, "sending message");

        let bytes = bincode::serialize(msg)?;
        let len = bytes.len();

        self.outbound
            .send(bytes)
            .await
            .map_err(|_| TransportError::Closed(self.peer))?;

        info!(session = %self.id, peer = %self.peer, %len, "sent message");

        Ok(())
    }

    /// Waits for the next message from the counterparty.
    ///
    /// Fails with [`TransportError::Timeout`] if nothing arrives within the receive timeout.
    pub async fn receive<T>(&mut self) -> TransportResult<T>
    where
        T: DeserializeOwned + fmt::Debug,
    {
        let received = tokio::time::timeout(self.receive_timeout, self.inbound.recv()).await;

        let bytes = match received {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(session = %self.id, peer = %self.peer, "counterparty closed the session");
                return Err(TransportError::Closed(self.peer));
            }
            Err(_) => {
                warn!(session = %self.id, peer = %self.peer, timeout = ?self.receive_timeout, "timed out waiting for message");
                return Err(TransportError::Timeout {
                    peer: self.peer,
                    after: self.receive_timeout,
                });
            }
        };

        let msg = bincode::deserialize(&bytes)?;
        trace!(session = %self.id, peer = %self.peer, ?msg, "received message");

        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use escrow_test_utils::prelude::generate_xonly_pubkey;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    enum Ping {
        Ping(u32),
        Pong(u32),
    }

    fn pair(timeout: Duration) -> (Session, Session) {
        Session::pair(
            SessionId(7),
            generate_xonly_pubkey(),
            generate_xonly_pubkey(),
            4,
            timeout,
        )
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (initiator, mut responder) = pair(Duration::from_secs(1));

        initiator.send(&Ping::Ping(1)).await.unwrap();
        initiator.send(&Ping::Ping(2)).await.unwrap();

        assert_eq!(responder.receive::<Ping>().await.unwrap(), Ping::Ping(1));
        assert_eq!(responder.receive::<Ping>().await.unwrap(), Ping::Ping(2));
    }

    #[tokio::test]
    async fn test_both_ends_agree_on_identity() {
        let (mut initiator, responder) = pair(Duration::from_secs(1));

        assert_eq!(initiator.id(), responder.id());
        assert_eq!(initiator.counterparty(), responder.local());
        assert_eq!(responder.counterparty(), initiator.local());

        responder.send(&Ping::Pong(3)).await.unwrap();
        assert_eq!(initiator.receive::<Ping>().await.unwrap(), Ping::Pong(3));
    }

    #[tokio::test]
    async fn test_receive_times_out() {
        let (_initiator, mut responder) = pair(Duration::from_millis(20));

        let err = responder.receive::<Ping>().await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_dropped_counterparty_closes_session() {
        let (initiator, mut responder) = pair(Duration::from_secs(1));
        let peer = initiator.local();
        drop(initiator);

        let err = responder.receive::<Ping>().await.unwrap_err();
        assert!(matches!(err, TransportError::Closed(key) if key == peer));

        let err = responder.send(&Ping::Pong(1)).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed(_)));
    }

    #[tokio::test]
    async fn test_wrong_message_type_is_a_codec_error() {
        let (initiator, mut responder) = pair(Duration::from_secs(1));

        initiator.send(&u8::MAX).await.unwrap();

        let err = responder.receive::<Ping>().await.unwrap_err();
        assert!(matches!(err, TransportError::Codec(_)), "{err}");
    }
}
