use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::error::AppError;

use super::key::QueryKey;
use super::tag::Tag;

/// Type-erased cached value. Downcast by [`QueryHandle`](super::QueryHandle).
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

/// A completed fetch: the value plus any tags derived from it.
pub(crate) struct Fetched {
    pub data: Erased,
    pub tags: Vec<Tag>,
}

pub(crate) type ErasedFetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Fetched, AppError>> + Send + Sync>;

/// The in-flight fetch all concurrent callers of a key attach to.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<Erased, AppError>>>;

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Uninitialized,
    Loading,
    Success,
    Error,
}

/// State broadcast to subscribers on every transition.
#[derive(Clone)]
pub(crate) struct Snapshot {
    pub status: EntryStatus,
    pub data: Option<Erased>,
    pub error: Option<AppError>,
    pub is_stale: bool,
}

/// Read-only view of a cache entry for inspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub key: QueryKey,
    pub status: EntryStatus,
    /// Sorted for stable comparison.
    pub tags: Vec<Tag>,
    pub last_fetched_at: Option<Instant>,
    pub subscriber_count: usize,
    pub is_stale: bool,
    pub is_fetching: bool,
    pub has_data: bool,
}

/// A cached query result with its tags, subscribers and fetch bookkeeping.
pub(crate) struct CacheEntry {
    pub key: QueryKey,
    pub status: EntryStatus,
    pub data: Option<Erased>,
    pub error: Option<AppError>,
    /// Tags declared by the caller; always indexed.
    pub static_tags: HashSet<Tag>,
    /// Static tags plus tags derived from the last successful result.
    pub tags: HashSet<Tag>,
    pub last_fetched_at: Option<Instant>,
    pub subscriber_count: usize,
    pub invalidated: bool,
    pub in_flight: Option<SharedFetch>,
    /// An invalidation arrived while a fetch was in flight.
    pub refetch_pending: bool,
    pub fetcher: ErasedFetcher,
    /// Per-query override of the eviction grace period.
    pub keep_unused_for: Option<Duration>,
    /// Bumped on every subscribe/unsubscribe; a pending eviction only fires
    /// if the generation it captured is still current.
    pub eviction_generation: u64,
    pub notifier: broadcast::Sender<Snapshot>,
}

impl CacheEntry {
    pub fn new(key: QueryKey, fetcher: ErasedFetcher, notify_capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(notify_capacity.max(1));
        Self {
            key,
            status: EntryStatus::Uninitialized,
            data: None,
            error: None,
            static_tags: HashSet::new(),
            tags: HashSet::new(),
            last_fetched_at: None,
            subscriber_count: 0,
            invalidated: false,
            in_flight: None,
            refetch_pending: false,
            fetcher,
            keep_unused_for: None,
            eviction_generation: 0,
            notifier,
        }
    }

    /// Checks if this entry is stale based on the given stale time.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        if self.invalidated {
            return true;
        }
        self.last_fetched_at
            .is_none_or(|fetched| fetched.elapsed() > stale_time)
    }

    /// Whether a new subscriber should trigger a fetch.
    pub fn needs_fetch(&self, stale_time: Duration) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        match self.status {
            EntryStatus::Uninitialized | EntryStatus::Error => true,
            EntryStatus::Loading | EntryStatus::Success => self.is_stale(stale_time),
        }
    }

    /// Stores a successful result, resetting staleness.
    pub fn succeed(&mut self, data: Erased, derived_tags: Vec<Tag>) {
        self.status = EntryStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.last_fetched_at = Some(Instant::now());
        self.invalidated = false;
        self.tags = self.static_tags.iter().cloned().chain(derived_tags).collect();
    }

    /// Stores a failure. Previously cached data is kept.
    pub fn fail(&mut self, error: AppError) {
        self.status = EntryStatus::Error;
        self.error = Some(error);
        self.tags = self.static_tags.clone();
    }

    /// Updates the entry with new data outside of a fetch.
    pub fn write(&mut self, data: Erased) {
        self.data = Some(data);
        self.status = EntryStatus::Success;
        self.error = None;
    }

    pub fn grace_period(&self, default: Duration) -> Duration {
        self.keep_unused_for.unwrap_or(default)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_stale: self.invalidated || self.in_flight.is_some(),
        }
    }

    /// Broadcasts the current state to every subscriber.
    pub fn notify(&self) {
        // No receivers is fine: nobody is watching this entry right now.
        let _ = self.notifier.send(self.snapshot());
    }

    pub fn info(&self, stale_time: Duration) -> CacheEntryInfo {
        let mut tags: Vec<Tag> = self.tags.iter().cloned().collect();
        tags.sort();
        CacheEntryInfo {
            key: self.key.clone(),
            status: self.status,
            tags,
            last_fetched_at: self.last_fetched_at,
            subscriber_count: self.subscriber_count,
            is_stale: self.is_stale(stale_time),
            is_fetching: self.in_flight.is_some(),
            has_data: self.data.is_some(),
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("status", &self.status)
            .field("tags", &self.tags)
            .field("subscriber_count", &self.subscriber_count)
            .field("invalidated", &self.invalidated)
            .field("in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn entry() -> CacheEntry {
        let fetcher: ErasedFetcher = Arc::new(|| {
            async {
                Ok(Fetched {
                    data: Arc::new(42_i32),
                    tags: Vec::new(),
                })
            }
            .boxed()
        });
        CacheEntry::new(QueryKey::from("key"), fetcher, 8)
    }

    #[test]
    fn test_new_entry() {
        let entry = entry();
        assert_eq!(entry.status, EntryStatus::Uninitialized);
        assert!(entry.data.is_none());
        assert!(entry.needs_fetch(Duration::MAX));
    }

    #[tokio::test]
    async fn test_succeed_is_fresh() {
        let mut entry = entry();
        entry.succeed(Arc::new(42_i32), vec![Tag::new("Pet", "42")]);
        assert_eq!(entry.status, EntryStatus::Success);
        assert!(!entry.is_stale(Duration::from_secs(1)));
        assert!(!entry.needs_fetch(Duration::from_secs(1)));
        assert!(entry.tags.contains(&Tag::new("Pet", "42")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_by_age() {
        let mut entry = entry();
        entry.succeed(Arc::new(42_i32), Vec::new());
        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(entry.is_stale(Duration::from_millis(5)));
        assert!(!entry.is_stale(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_invalidated_is_stale() {
        let mut entry = entry();
        entry.succeed(Arc::new(42_i32), Vec::new());
        entry.invalidated = true;
        assert!(entry.is_stale(Duration::MAX));
        assert!(entry.needs_fetch(Duration::MAX));
    }

    #[tokio::test]
    async fn test_fail_keeps_data_and_static_tags() {
        let mut entry = entry();
        entry.static_tags.insert(Tag::list("Pet"));
        entry.succeed(Arc::new(1_i32), vec![Tag::new("Pet", "1")]);
        entry.fail(AppError::network("offline"));

        assert_eq!(entry.status, EntryStatus::Error);
        assert!(entry.data.is_some());
        assert_eq!(entry.tags, HashSet::from([Tag::list("Pet")]));
        assert!(entry.needs_fetch(Duration::MAX));
    }
}
