//! In-memory implementations of the storage traits.

mod attachments;
mod ledger;

pub use attachments::InMemoryAttachmentStore;
pub use ledger::InMemoryLedger;
