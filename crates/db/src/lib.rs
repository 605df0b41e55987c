//! Storage for the escrow: the ledger of committed transactions and the attachment store.
//!
//! Both are consumed through traits so that the workflows never depend on a concrete backend.
//! The in-memory ledger doubles as the finality service: it is where competing transactions on
//! the same deposit are ordered.

pub mod attachments;
pub mod errors;
pub mod fs;
pub mod inmemory;
pub mod ledger;

pub mod prelude {
    //! Re-exports of the storage traits and their implementations.

    pub use crate::{
        attachments::AttachmentStore,
        errors::{DbError, DbResult},
        fs::FsAttachmentStore,
        inmemory::{InMemoryAttachmentStore, InMemoryLedger},
        ledger::{LedgerStore, SubmitOutcome},
    };
}
