//! Persistence ports used by the post store.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::posts::Post;

/// The shared document service could not be used; callers degrade to the local cache.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote store returned a malformed document: {0}")]
    Malformed(String),
    #[error("remote store endpoint is invalid: {0}")]
    Url(#[from] url::ParseError),
    #[error("remote store is disabled")]
    Disabled,
}

impl RemoteError {
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode cached posts: {0}")]
    Encode(serde_json::Error),
    #[error("failed to decode cached posts: {0}")]
    Decode(serde_json::Error),
}

/// Shared JSON document holding the whole post sequence.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the current sequence. A document that does not exist yet is an empty sequence.
    async fn load(&self) -> Result<Vec<Post>, RemoteError>;

    /// Overwrite the document with the full sequence (last writer wins).
    async fn save(&self, posts: &[Post]) -> Result<(), RemoteError>;
}

/// Durable local slot mirroring the sequence.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Read the slot, reporting missing or corrupt contents as errors.
    async fn try_load(&self) -> Result<Option<Vec<Post>>, CacheError>;

    async fn save(&self, posts: &[Post]) -> Result<(), CacheError>;

    /// Read the slot; missing or unreadable contents yield an empty sequence.
    async fn load(&self) -> Vec<Post> {
        match self.try_load().await {
            Ok(posts) => posts.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable local cache");
                Vec::new()
            }
        }
    }
}
