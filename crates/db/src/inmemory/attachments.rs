use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use escrow_primitives::attachment::AttachmentRef;
use tokio::sync::RwLock;
use tracing::trace;

use crate::{
    attachments::AttachmentStore,
    errors::{DbError, DbResult},
};

/// Attachments held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAttachmentStore {
    /// attachment -> content
    blobs: Arc<RwLock<HashMap<AttachmentRef, Vec<u8>>>>,
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn save(&self, content: Vec<u8>) -> DbResult<AttachmentRef> {
        let attachment = AttachmentRef::of(&content);
        trace!(%attachment, len = content.len(), "saving attachment");

        self.blobs.write().await.entry(attachment).or_insert(content);

        Ok(attachment)
    }

    async fn load(&self, attachment: AttachmentRef) -> DbResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(&attachment)
            .cloned()
            .ok_or(DbError::AttachmentNotFound(attachment))
    }

    async fn contains(&self, attachment: AttachmentRef) -> DbResult<bool> {
        Ok(self.blobs.read().await.contains_key(&attachment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saved_content_is_loaded_by_its_hash() {
        let store = InMemoryAttachmentStore::default();

        let attachment = store.save(b"inventory".to_vec()).await.unwrap();

        assert_eq!(attachment, AttachmentRef::of(b"inventory"));
        assert!(store.contains(attachment).await.unwrap());
        assert_eq!(store.load(attachment).await.unwrap(), b"inventory");
    }

    #[tokio::test]
    async fn loading_unknown_content_fails() {
        let store = InMemoryAttachmentStore::default();
        let attachment = AttachmentRef::of(b"missing");

        assert!(!store.contains(attachment).await.unwrap());
        assert!(matches!(
            store.load(attachment).await,
            Err(DbError::AttachmentNotFound(a)) if a == attachment
        ));
    }
}
