//! Adapters behind the persistence ports, plus process-level plumbing.

pub mod error;
pub mod file_cache;
pub mod memory;
pub mod remote;
pub mod telemetry;

use std::sync::Arc;

use crate::application::repos::{LocalCache, RemoteStore};
use crate::application::store::PostStore;
use crate::config::Settings;

use self::error::InfraError;
use self::file_cache::{DisabledCache, FileCache};
use self::remote::{DisabledRemote, JsonBinStore};

/// Wire the remote document client and the local cache described by `settings` into a store.
pub fn build_post_store(settings: &Settings) -> Result<PostStore, InfraError> {
    let remote: Arc<dyn RemoteStore> = if settings.remote.enabled {
        Arc::new(JsonBinStore::new(
            &settings.remote.base_url,
            &settings.remote.document_id,
            settings.remote.access_key.clone(),
        )?)
    } else {
        Arc::new(DisabledRemote)
    };

    let cache: Arc<dyn LocalCache> = if settings.cache.enabled {
        Arc::new(FileCache::new(&settings.cache.directory, &settings.cache.key))
    } else {
        Arc::new(DisabledCache)
    };

    Ok(PostStore::new(remote, cache))
}
