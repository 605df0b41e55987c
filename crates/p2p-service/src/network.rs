//! An in-process network connecting the parties of a deposit.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use secp256k1::XOnlyPublicKey;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::{
    config::Configuration,
    errors::{TransportError, TransportResult},
    session::{Session, SessionId, SessionTransport},
};

/// Routes new sessions to the inbox of the party they are addressed to.
#[derive(Debug, Clone)]
pub struct InMemoryNetwork {
    /// party key -> sender half of the party's inbox
    inboxes: Arc<RwLock<HashMap<XOnlyPublicKey, mpsc::Sender<Session>>>>,

    next_session: Arc<AtomicU64>,

    config: Configuration,
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl InMemoryNetwork {
    pub fn new(config: Configuration) -> Self {
        Self {
            inboxes: Arc::new(RwLock::new(HashMap::new())),
            next_session: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    /// Joins the network as `party`.
    ///
    /// Returns the handle to open sessions with, and the inbox that receives the sessions others
    /// open with `party`.
    pub async fn register(&self, party: XOnlyPublicKey) -> TransportResult<(NetworkHandle, Inbox)> {
        let mut inboxes = self.inboxes.write().await;

        if inboxes.get(&party).is_some_and(|inbox| !inbox.is_closed()) {
            return Err(TransportError::AlreadyRegistered(party));
        }

        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);
        inboxes.insert(party, sender);

        info!(%party, "registered party");

        let handle = NetworkHandle {
            local: party,
            network: self.clone(),
        };
        let inbox = Inbox {
            local: party,
            sessions: receiver,
        };

        Ok((handle, inbox))
    }

    /// Leaves the network. Sessions already open stay open.
    pub async fn unregister(&self, party: &XOnlyPublicKey) {
        if self.inboxes.write().await.remove(party).is_some() {
            info!(%party, "unregistered party");
        }
    }

    async fn connect(&self, from: XOnlyPublicKey, to: XOnlyPublicKey) -> TransportResult<Session> {
        let inbox = self
            .inboxes
            .read()
            .await
            .get(&to)
            .cloned()
            .ok_or(TransportError::UnknownPeer(to))?;

        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let (local, remote) = Session::pair(
            id,
            from,
            to,
            self.config.channel_capacity,
            self.config.receive_timeout,
        );

        inbox
            .send(remote)
            .await
            .map_err(|_| TransportError::UnknownPeer(to))?;

        debug!(session = %id, %from, %to, "opened session");

        Ok(local)
    }
}

/// Opens sessions on behalf of one registered party.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    local: XOnlyPublicKey,

    network: InMemoryNetwork,
}

#[async_trait]
impl SessionTransport for NetworkHandle {
    fn local(&self) -> XOnlyPublicKey {
        self.local
    }

    async fn open_session(&self, peer: XOnlyPublicKey) -> TransportResult<Session> {
        self.network.connect(self.local, peer).await
    }
}

/// Receives the sessions other parties open with the owner of the inbox.
pub struct Inbox {
    local: XOnlyPublicKey,

    sessions: mpsc::Receiver<Session>,
}

impl fmt::Debug for Inbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox").field("local", &self.local).finish()
    }
}

impl Inbox {
    pub const fn local(&self) -> XOnlyPublicKey {
        self.local
    }

    /// Waits for the next incoming session.
    ///
    /// Returns `None` once the party has left the network and every pending session has been
    /// taken.
    pub async fn accept(&mut self) -> Option<Session> {
        self.sessions.recv().await
    }
}
