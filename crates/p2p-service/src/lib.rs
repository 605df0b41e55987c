//! Point-to-point sessions between the parties of a deposit.
//!
//! A workflow talks to each counterparty over its own [`Session`]. Sessions carry
//! bincode-encoded messages and enforce a receive timeout, so a silent counterparty surfaces as
//! an error instead of a hung workflow.

pub mod config;
pub mod errors;
pub mod network;
pub mod session;

pub use config::Configuration;
pub use errors::{TransportError, TransportResult};
pub use network::{InMemoryNetwork, Inbox, NetworkHandle};
pub use session::{Session, SessionId, SessionTransport};
