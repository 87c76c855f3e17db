//! In-process cache slot holding the serialized sequence, like a browser storage key.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::repos::{CacheError, LocalCache};
use crate::domain::posts::Post;
use crate::util::lock::lock_or_recover;

const SLOT: &str = "infra::memory";

#[derive(Debug, Default)]
pub struct MemoryCache {
    raw: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            raw: Mutex::new(serde_json::to_string(&posts).ok()),
        }
    }

    /// Seed the slot with arbitrary text, e.g. a corrupt payload.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// Decoded slot contents, `None` when empty or unreadable.
    pub fn snapshot(&self) -> Option<Vec<Post>> {
        self.decode("snapshot").ok().flatten()
    }

    fn decode(&self, op: &'static str) -> Result<Option<Vec<Post>>, CacheError> {
        let raw = lock_or_recover(&self.raw, SLOT, op).clone();
        raw.map(|text| serde_json::from_str(&text).map_err(CacheError::Decode))
            .transpose()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn try_load(&self) -> Result<Option<Vec<Post>>, CacheError> {
        self.decode("try_load")
    }

    async fn save(&self, posts: &[Post]) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(posts).map_err(CacheError::Encode)?;
        *lock_or_recover(&self.raw, SLOT, "save") = Some(encoded);
        Ok(())
    }
}
