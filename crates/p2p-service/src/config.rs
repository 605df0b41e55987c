//! Configuration for the session layer.

use std::time::Duration;

/// Default time to wait for a counterparty's next message.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of messages buffered per direction of a session.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    /// How long [`Session::receive`](crate::Session::receive) waits before giving up.
    pub receive_timeout: Duration,

    /// Number of messages buffered per direction of a session, and of sessions buffered per
    /// inbox.
    pub channel_capacity: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Configuration {
    /// Returns a copy with the given receive timeout.
    pub const fn with_receive_timeout(mut self, receive_timeout: Duration) -> Self {
        self.receive_timeout = receive_timeout;
        self
    }
}
