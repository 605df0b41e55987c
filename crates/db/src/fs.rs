//! Attachments stored as files named after their hash.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use escrow_primitives::attachment::AttachmentRef;
use tracing::{debug, warn};

use crate::{
    attachments::AttachmentStore,
    errors::{DbError, DbResult},
};

/// An [`AttachmentStore`] backed by a directory.
///
/// Content is written to a temporary file first and then renamed into place, so a reader never
/// observes a partially written attachment.
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    /// Opens the store rooted at `root`, creating the directory if necessary.
    pub async fn open(root: impl AsRef<Path>) -> DbResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        debug!(root = %root.display(), "opened attachment store");

        Ok(Self { root })
    }

    fn path_of(&self, attachment: &AttachmentRef) -> PathBuf {
        self.root.join(attachment.to_string())
    }
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn save(&self, content: Vec<u8>) -> DbResult<AttachmentRef> {
        let attachment = AttachmentRef::of(&content);
        let path = self.path_of(&attachment);

        if tokio::fs::try_exists(&path).await? {
            return Ok(attachment);
        }

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(%attachment, len = content.len(), "saved attachment");

        Ok(attachment)
    }

    async fn load(&self, attachment: AttachmentRef) -> DbResult<Vec<u8>> {
        let content = match tokio::fs::read(self.path_of(&attachment)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DbError::AttachmentNotFound(attachment));
            }
            Err(e) => return Err(e.into()),
        };

        if AttachmentRef::of(&content) != attachment {
            warn!(%attachment, "stored attachment does not match its hash");
            return Err(DbError::CorruptAttachment(attachment));
        }

        Ok(content)
    }

    async fn contains(&self, attachment: AttachmentRef) -> DbResult<bool> {
        Ok(tokio::fs::try_exists(self.path_of(&attachment)).await?)
    }
}
