//! Local cache kept as one JSON file per cache key.

use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::repos::{CacheError, LocalCache};
use crate::domain::posts::Post;

#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    writes: AtomicU64,
}

impl FileCache {
    /// Cache stored at `<directory>/<key>.json`.
    pub fn new(directory: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: directory.as_ref().join(format!("{key}.json")),
            writes: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let sequence = self.writes.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_extension(format!("json.{}.{sequence}.tmp", std::process::id()))
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn try_load(&self) -> Result<Option<Vec<Post>>, CacheError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(CacheError::Decode)
    }

    async fn save(&self, posts: &[Post]) -> Result<(), CacheError> {
        let encoded = serde_json::to_vec(posts).map_err(CacheError::Encode)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Readers only ever see a complete file: write beside the target, then rename.
        let staging = self.staging_path();
        fs::write(&staging, &encoded).await?;
        if let Err(err) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }

        debug!(path = %self.path.display(), posts = posts.len(), "Posts mirrored to local cache");
        Ok(())
    }
}

/// Stand-in used when the local cache is switched off: always empty, saves are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCache;

#[async_trait]
impl LocalCache for DisabledCache {
    async fn try_load(&self) -> Result<Option<Vec<Post>>, CacheError> {
        Ok(None)
    }

    async fn save(&self, _posts: &[Post]) -> Result<(), CacheError> {
        Ok(())
    }
}
