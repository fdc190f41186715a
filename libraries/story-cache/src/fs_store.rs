/// Filesystem-backed story media cache
use async_trait::async_trait;
use story_core::{LocalCacheStore, Result, StoryError, StoryId};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Cache directory holding one file per story id
///
/// Files are written to a `.part` sibling and renamed into place, so a
/// file at `path_for` is always complete.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache directory
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// File name for a story id
    ///
    /// Ids made only of `[A-Za-z0-9_-]` are used as-is. Any other id is
    /// hex-encoded behind a `~` prefix, which plain ids cannot contain, so
    /// distinct ids never share a file.
    fn file_name(id: &StoryId, extension: &str) -> String {
        let raw = id.as_str();
        let plain = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if plain {
            format!("{}.{}", raw, extension)
        } else {
            format!("~{}.{}", hex::encode(raw), extension)
        }
    }
}

#[async_trait]
impl LocalCacheStore for FsCacheStore {
    async fn exists(&self, id: &StoryId, extension: &str) -> bool {
        match fs::metadata(self.path_for(id, extension)).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    async fn write(&self, id: &StoryId, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(id, extension);
        let partial = self
            .root
            .join(format!(".{}.part", Self::file_name(id, extension)));

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoryError::cache_write(format!("{}: {}", self.root.display(), e)))?;

        fs::write(&partial, bytes)
            .await
            .map_err(|e| StoryError::cache_write(format!("{}: {}", partial.display(), e)))?;

        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StoryError::cache_write(format!("{}: {}", path.display(), e)));
        }

        debug!(story_id = %id, path = %path.display(), size = bytes.len(), "Cached story media");
        Ok(path)
    }

    fn path_for(&self, id: &StoryId, extension: &str) -> PathBuf {
        self.root.join(Self::file_name(id, extension))
    }
}
