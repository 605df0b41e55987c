//! Content-addressed storage for inventories and evidence.

use async_trait::async_trait;
use escrow_primitives::attachment::AttachmentRef;

use crate::errors::DbResult;

/// A blob store keyed by the sha256 of the content.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Stores `content` and returns its reference. Saving the same content twice is a no-op.
    async fn save(&self, content: Vec<u8>) -> DbResult<AttachmentRef>;

    /// Loads the content stored under `attachment`.
    async fn load(&self, attachment: AttachmentRef) -> DbResult<Vec<u8>>;

    /// Returns `true` if content is stored under `attachment`.
    async fn contains(&self, attachment: AttachmentRef) -> DbResult<bool>;
}
