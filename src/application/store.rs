//! The in-memory post sequence and its persistence policy.
//!
//! Mutations apply to the owned `Vec<Post>` synchronously and then spawn a
//! save of the full sequence: first to the remote document, then, whatever the
//! remote outcome, to the local cache. Saves are never awaited by the mutating
//! call and are not serialized against each other, so when two saves overlap
//! the one that finishes last wins in both stores. Failed remote saves are
//! logged and never rolled back or retried.
//!
//! Outside a Tokio runtime there is nothing to spawn onto, so the save runs to
//! completion on a private current-thread runtime before the mutation returns.

use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use time::OffsetDateTime;
use tokio::runtime::{Builder, Handle};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::feed::{FeedState, SortOrder};
use crate::application::repos::{LocalCache, RemoteError, RemoteStore};
use crate::domain::{
    error::DomainError,
    identity::Identity,
    posts::{NewPost, Post, PostId},
};

/// Where the sequence adopted by [`PostStore::initialize`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Empty,
}

impl LoadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadSource::Remote => "remote",
            LoadSource::Cache => "cache",
            LoadSource::Empty => "empty",
        }
    }
}

/// Outcome of one background save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    pub remote_saved: bool,
    pub cache_saved: bool,
}

/// Proof that the user agreed to wipe every post. Only the UI can mint one.
#[derive(Debug)]
pub struct ClearConfirmation(());

impl ClearConfirmation {
    pub fn granted(answer: bool) -> Option<Self> {
        answer.then_some(Self(()))
    }
}

/// Hands out ids derived from the creation time, bumped past the last issued id
/// so two posts created in the same millisecond never share one.
#[derive(Debug, Default)]
struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    fn observe(&mut self, id: PostId) {
        self.last = self.last.max(id.get());
    }

    fn next(&mut self, now: OffsetDateTime) -> PostId {
        let millis = u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
        let id = millis.max(self.last.saturating_add(1));
        self.last = id;
        PostId(id)
    }
}

pub struct PostStore {
    posts: Vec<Post>,
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    ids: IdGenerator,
    source: Option<LoadSource>,
    in_flight: Vec<JoinHandle<PersistReport>>,
    settled: Vec<PersistReport>,
}

impl PostStore {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            posts: Vec::new(),
            remote,
            cache,
            ids: IdGenerator::default(),
            source: None,
            in_flight: Vec::new(),
            settled: Vec::new(),
        }
    }

    /// Adopt the remote sequence, or the local cache when the remote is unavailable.
    pub async fn initialize(&mut self) -> &[Post] {
        let (posts, source) = match self.remote.load().await {
            Ok(posts) => (posts, LoadSource::Remote),
            Err(err) => {
                warn!(error = %err, "Remote store unavailable; falling back to local cache");
                counter!("corkboard_initialize_fallback_total").increment(1);
                let cached = self.cache.load().await;
                if cached.is_empty() {
                    (cached, LoadSource::Empty)
                } else {
                    (cached, LoadSource::Cache)
                }
            }
        };

        info!(
            source = source.as_str(),
            posts = posts.len(),
            "Post store initialized"
        );

        for post in &posts {
            self.ids.observe(post.id);
        }
        self.posts = posts;
        self.source = Some(source);
        &self.posts
    }

    pub fn load_source(&self) -> Option<LoadSource> {
        self.source
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn project(&self, state: &FeedState) -> Vec<&Post> {
        state.project(&self.posts)
    }

    /// Create a post at the front of the sequence, stamped with the current time.
    pub fn create_post(&mut self, draft: &NewPost, author: &Identity) -> Result<Post, DomainError> {
        self.create_post_at(draft, author, OffsetDateTime::now_utc())
    }

    pub fn create_post_at(
        &mut self,
        draft: &NewPost,
        author: &Identity,
        now: OffsetDateTime,
    ) -> Result<Post, DomainError> {
        draft.validate()?;

        let id = self.ids.next(now);
        let post = Post::from_draft(id, draft, author, now)?;
        self.posts.insert(0, post.clone());
        debug!(post_id = %id, category = %post.category, "Post created");

        self.persist();
        Ok(post)
    }

    pub fn toggle_like(&mut self, id: PostId) -> Result<Post, DomainError> {
        let post = self.find_mut(id)?;
        post.toggle_like();
        let updated = post.clone();

        self.persist();
        Ok(updated)
    }

    pub fn add_comment(&mut self, id: PostId) -> Result<Post, DomainError> {
        let post = self.find_mut(id)?;
        post.record_comment();
        let updated = post.clone();

        self.persist();
        Ok(updated)
    }

    pub fn clear_all(&mut self, _confirmation: ClearConfirmation) {
        let removed = self.posts.len();
        self.posts.clear();
        info!(removed, "All posts cleared");

        self.persist();
    }

    /// Reorder the whole sequence in place. Equal keys keep their relative order.
    pub fn sort(&mut self, order: SortOrder) {
        self.posts.sort_by(|left, right| order.compare(left, right));
    }

    /// Wait for every save that has not been collected yet.
    pub async fn flush(&mut self) -> Vec<PersistReport> {
        let mut reports = std::mem::take(&mut self.settled);
        let handles = std::mem::take(&mut self.in_flight);
        reports.extend(
            join_all(handles)
                .await
                .into_iter()
                .filter_map(|joined| match joined {
                    Ok(report) => Some(report),
                    Err(err) => {
                        warn!(error = %err, "Persistence task did not complete");
                        None
                    }
                }),
        );
        reports
    }

    fn find_mut(&mut self, id: PostId) -> Result<&mut Post, DomainError> {
        match self.posts.iter_mut().find(|post| post.id == id) {
            Some(post) => Ok(post),
            None => {
                debug!(post_id = %id, "Ignoring operation on unknown post");
                Err(DomainError::not_found(id))
            }
        }
    }

    fn persist(&mut self) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let snapshot = self.posts.clone();
        let remote = Arc::clone(&self.remote);
        let cache = Arc::clone(&self.cache);

        match Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn(async move {
                    save_snapshot(remote.as_ref(), cache.as_ref(), &snapshot).await
                });
                self.in_flight.push(handle);
            }
            Err(_) => {
                warn!("No async runtime active; saving before returning");
                match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => {
                        let report = runtime.block_on(save_snapshot(
                            remote.as_ref(),
                            cache.as_ref(),
                            &snapshot,
                        ));
                        self.settled.push(report);
                    }
                    Err(err) => {
                        warn!(error = %err, "Could not start a runtime; changes kept in memory only");
                    }
                }
            }
        }
    }
}

async fn save_snapshot(
    remote: &dyn RemoteStore,
    cache: &dyn LocalCache,
    posts: &[Post],
) -> PersistReport {
    let remote_saved = match remote.save(posts).await {
        Ok(()) => {
            counter!("corkboard_persist_remote_ok_total").increment(1);
            debug!(posts = posts.len(), "Posts saved to remote store");
            true
        }
        Err(RemoteError::Disabled) => {
            debug!("Remote store disabled; saving locally only");
            false
        }
        Err(err) => {
            counter!("corkboard_persist_remote_failed_total").increment(1);
            warn!(error = %err, posts = posts.len(), "Remote save failed; local copy kept");
            false
        }
    };

    let cache_saved = match cache.save(posts).await {
        Ok(()) => true,
        Err(err) => {
            counter!("corkboard_persist_cache_failed_total").increment(1);
            warn!(error = %err, "Local cache save failed");
            false
        }
    };

    PersistReport {
        remote_saved,
        cache_saved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::feed::{CategoryFilter, SortOrder};
    use crate::domain::posts::Category;
    use crate::infra::memory::MemoryCache;
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };
    use time::{Duration, macros::datetime};

    #[derive(Default)]
    struct StubRemote {
        document: Mutex<Vec<Post>>,
        offline: AtomicBool,
        saves: AtomicUsize,
    }

    impl StubRemote {
        fn offline() -> Self {
            let remote = Self::default();
            remote.offline.store(true, Ordering::SeqCst);
            remote
        }

        fn document(&self) -> Vec<Post> {
            self.document.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteStore for StubRemote {
        async fn load(&self) -> Result<Vec<Post>, RemoteError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(RemoteError::Status {
                    status: 503,
                    body: "down".into(),
                });
            }
            Ok(self.document())
        }

        async fn save(&self, posts: &[Post]) -> Result<(), RemoteError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(RemoteError::Status {
                    status: 503,
                    body: "down".into(),
                });
            }
            *self.document.lock().unwrap() = posts.to_vec();
            Ok(())
        }
    }

    fn seeded_post(id: u64, title: &str, at: OffsetDateTime) -> Post {
        Post::from_draft(
            PostId(id),
            &NewPost::new(title, "body", Category::General),
            &Identity::guest(),
            at,
        )
        .expect("valid draft")
    }

    fn store_with(remote: Arc<StubRemote>, cache: Arc<MemoryCache>) -> PostStore {
        PostStore::new(remote, cache)
    }

    #[tokio::test]
    async fn create_inserts_at_front_regardless_of_sort() {
        let remote = Arc::new(StubRemote::default());
        let cache = Arc::new(MemoryCache::default());
        let mut store = store_with(remote.clone(), cache.clone());
        store.initialize().await;

        let base = datetime!(2024-03-01 09:00 UTC);
        store
            .create_post_at(&NewPost::new("first", "a", Category::Idea), &Identity::guest(), base)
            .expect("first post");
        store.sort(SortOrder::Oldest);
        let created = store
            .create_post_at(
                &NewPost::new("second", "b", Category::Idea),
                &Identity::guest(),
                base - Duration::days(1),
            )
            .expect("second post");

        assert_eq!(store.len(), 2);
        assert_eq!(store.posts()[0].id, created.id);

        store.flush().await;
        assert_eq!(remote.document().len(), 2);
        assert_eq!(cache.snapshot().map(|posts| posts.len()), Some(2));
    }

    #[tokio::test]
    async fn guest_post_scenario() {
        let mut store = store_with(
            Arc::new(StubRemote::default()),
            Arc::new(MemoryCache::default()),
        );
        let post = store
            .create_post(
                &NewPost::new("Hi", "World", Category::General),
                &Identity::guest(),
            )
            .expect("post created");

        assert_eq!(post.author, "Guest User");
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
        assert!(!post.liked);
        assert!(post.tags.is_empty());
        store.flush().await;
    }

    #[tokio::test]
    async fn invalid_draft_leaves_sequence_untouched() {
        let remote = Arc::new(StubRemote::default());
        let mut store = store_with(remote.clone(), Arc::new(MemoryCache::default()));

        let err = store
            .create_post(&NewPost::new("", "World", Category::General), &Identity::guest())
            .expect_err("blank title");
        assert!(matches!(err, DomainError::Validation { field: "title", .. }));
        assert!(store.is_empty());
        assert!(store.flush().await.is_empty());
        assert_eq!(remote.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_millisecond_posts_get_distinct_ids() {
        let mut store = store_with(
            Arc::new(StubRemote::default()),
            Arc::new(MemoryCache::default()),
        );
        let now = datetime!(2024-03-01 09:00 UTC);
        let draft = NewPost::new("t", "c", Category::General);
        let first = store.create_post_at(&draft, &Identity::guest(), now).expect("first");
        let second = store.create_post_at(&draft, &Identity::guest(), now).expect("second");
        assert!(second.id > first.id);
        store.flush().await;
    }

    #[tokio::test]
    async fn ids_continue_past_adopted_posts() {
        let remote = Arc::new(StubRemote::default());
        let far_future = u64::MAX / 2;
        *remote.document.lock().unwrap() = vec![seeded_post(
            far_future,
            "future",
            datetime!(2024-01-01 00:00 UTC),
        )];
        let mut store = store_with(remote, Arc::new(MemoryCache::default()));
        store.initialize().await;

        let post = store
            .create_post(&NewPost::new("t", "c", Category::General), &Identity::guest())
            .expect("post");
        assert_eq!(post.id, PostId(far_future + 1));
        store.flush().await;
    }

    #[tokio::test]
    async fn toggle_like_twice_restores_original_state() {
        let remote = Arc::new(StubRemote::default());
        let mut store = store_with(remote.clone(), Arc::new(MemoryCache::default()));
        let post = store
            .create_post(&NewPost::new("t", "c", Category::General), &Identity::guest())
            .expect("post");

        let liked = store.toggle_like(post.id).expect("like");
        assert!(liked.liked);
        assert_eq!(liked.like_count, 1);

        let unliked = store.toggle_like(post.id).expect("unlike");
        assert!(!unliked.liked);
        assert_eq!(unliked.like_count, 0);

        let reports = store.flush().await;
        assert_eq!(reports.last().map(|report| report.remote_saved), Some(true));
        assert_eq!(remote.document()[0].like_count, 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported_without_saving() {
        let remote = Arc::new(StubRemote::default());
        let mut store = store_with(remote.clone(), Arc::new(MemoryCache::default()));

        assert_eq!(
            store.toggle_like(PostId(42)).expect_err("missing"),
            DomainError::not_found(PostId(42))
        );
        assert!(store.add_comment(PostId(42)).is_err());
        assert!(store.flush().await.is_empty());
        assert_eq!(remote.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn comment_increments_count() {
        let mut store = store_with(
            Arc::new(StubRemote::default()),
            Arc::new(MemoryCache::default()),
        );
        let post = store
            .create_post(&NewPost::new("t", "c", Category::Question), &Identity::guest())
            .expect("post");

        store.add_comment(post.id).expect("comment");
        let updated = store.add_comment(post.id).expect("comment");
        assert_eq!(updated.comment_count, 2);
        assert_eq!(store.get(post.id).map(|p| p.comment_count), Some(2));
        store.flush().await;
    }

    #[tokio::test]
    async fn remote_failure_during_initialize_uses_cache_contents() {
        let cached = vec![
            seeded_post(2, "two", datetime!(2024-01-02 00:00 UTC)),
            seeded_post(1, "one", datetime!(2024-01-01 00:00 UTC)),
        ];
        let cache = Arc::new(MemoryCache::with_posts(cached.clone()));
        let mut store = store_with(Arc::new(StubRemote::offline()), cache);

        assert_eq!(store.initialize().await, cached.as_slice());
        assert_eq!(store.load_source(), Some(LoadSource::Cache));
    }

    #[tokio::test]
    async fn remote_failure_with_empty_cache_starts_empty() {
        let mut store = store_with(
            Arc::new(StubRemote::offline()),
            Arc::new(MemoryCache::default()),
        );
        assert!(store.initialize().await.is_empty());
        assert_eq!(store.load_source(), Some(LoadSource::Empty));
    }

    #[tokio::test]
    async fn remote_success_wins_over_cache() {
        let remote = Arc::new(StubRemote::default());
        *remote.document.lock().unwrap() =
            vec![seeded_post(7, "remote", datetime!(2024-01-01 00:00 UTC))];
        let cache = Arc::new(MemoryCache::with_posts(vec![seeded_post(
            9,
            "cached",
            datetime!(2024-01-01 00:00 UTC),
        )]));
        let mut store = store_with(remote, cache);

        let posts = store.initialize().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "remote");
        assert_eq!(store.load_source(), Some(LoadSource::Remote));
    }

    #[tokio::test]
    async fn failed_remote_save_still_mirrors_to_cache() {
        let remote = Arc::new(StubRemote::offline());
        let cache = Arc::new(MemoryCache::default());
        let mut store = store_with(remote.clone(), cache.clone());
        store.initialize().await;

        let post = store
            .create_post(&NewPost::new("t", "c", Category::Idea), &Identity::guest())
            .expect("post survives remote failure");
        let reports = store.flush().await;

        assert_eq!(
            reports,
            vec![PersistReport {
                remote_saved: false,
                cache_saved: true
            }]
        );
        assert_eq!(store.posts()[0].id, post.id);
        assert_eq!(cache.snapshot().map(|posts| posts.len()), Some(1));
    }

    #[tokio::test]
    async fn clear_all_empties_both_stores() {
        let remote = Arc::new(StubRemote::default());
        let cache = Arc::new(MemoryCache::default());
        let mut store = store_with(remote.clone(), cache.clone());
        let base = datetime!(2024-03-01 09:00 UTC);
        for offset in 0..5 {
            store
                .create_post_at(
                    &NewPost::new(format!("post {offset}"), "c", Category::General),
                    &Identity::guest(),
                    base + Duration::minutes(offset),
                )
                .expect("post");
        }
        store.flush().await;
        assert_eq!(remote.document().len(), 5);

        let confirmation = ClearConfirmation::granted(true).expect("confirmed");
        store.clear_all(confirmation);
        assert!(store.is_empty());

        store.flush().await;
        assert!(remote.document().is_empty());
        assert_eq!(cache.snapshot(), Some(Vec::new()));
    }

    #[test]
    fn mutations_without_runtime_save_before_returning() {
        let remote = Arc::new(StubRemote::default());
        let cache = Arc::new(MemoryCache::default());
        let mut store = store_with(remote.clone(), cache.clone());

        let post = store
            .create_post(&NewPost::new("t", "c", Category::General), &Identity::guest())
            .expect("post");
        store.toggle_like(post.id).expect("like");

        assert_eq!(remote.document().len(), 1);
        assert!(remote.document()[0].liked);
        assert_eq!(cache.snapshot().map(|posts| posts.len()), Some(1));

        let reports = futures::executor::block_on(store.flush());
        assert_eq!(
            reports,
            vec![
                PersistReport {
                    remote_saved: true,
                    cache_saved: true
                };
                2
            ]
        );
    }

    #[test]
    fn declined_confirmation_is_not_granted() {
        assert!(ClearConfirmation::granted(false).is_none());
    }

    #[tokio::test]
    async fn oldest_then_newest_reverses_with_stable_ties() {
        let base = datetime!(2024-01-01 00:00 UTC);
        let remote = Arc::new(StubRemote::default());
        *remote.document.lock().unwrap() = vec![
            seeded_post(1, "a", base + Duration::hours(1)),
            seeded_post(2, "tie-first", base),
            seeded_post(3, "c", base + Duration::hours(2)),
            seeded_post(4, "tie-second", base),
        ];
        let mut store = store_with(remote, Arc::new(MemoryCache::default()));
        store.initialize().await;

        store.sort(SortOrder::Oldest);
        let titles: Vec<&str> = store.posts().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["tie-first", "tie-second", "a", "c"]);

        store.sort(SortOrder::Newest);
        let titles: Vec<&str> = store.posts().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "tie-first", "tie-second"]);
    }

    #[tokio::test]
    async fn projection_reads_without_reordering_store() {
        let mut store = store_with(
            Arc::new(StubRemote::default()),
            Arc::new(MemoryCache::default()),
        );
        let base = datetime!(2024-03-01 09:00 UTC);
        store
            .create_post_at(&NewPost::new("q", "c", Category::Question), &Identity::guest(), base)
            .expect("post");
        store
            .create_post_at(
                &NewPost::new("i", "c", Category::Idea),
                &Identity::guest(),
                base + Duration::minutes(1),
            )
            .expect("post");

        let state = FeedState::new(CategoryFilter::Only(Category::Question), SortOrder::Newest);
        let visible = store.project(&state);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "q");
        assert_eq!(store.posts()[0].title, "i");
        store.flush().await;
    }
}
