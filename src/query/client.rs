use std::collections::{BTreeSet, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::StreamExt;
use tokio::sync::broadcast;

use crate::command::Command;
use crate::error::AppError;

use super::cache::{
    CacheEntry, CacheEntryInfo, EntryStatus, Erased, ErasedFetcher, Fetched, SharedFetch,
    Snapshot,
};
use super::config::QueryConfig;
use super::key::QueryKey;
use super::tag::Tag;

type Provides<V> = Arc<dyn Fn(&V) -> Vec<Tag> + Send + Sync>;

/// The state of a query result.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Query is loading and has no data yet.
    Loading,
    /// Query has data.
    Success {
        /// The data returned by the query.
        data: T,
        /// Whether the data is stale (invalidated or being revalidated).
        is_stale: bool,
    },
    /// Query failed with an error.
    Error(AppError),
}

/// A query result containing the current state.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    /// The current state of the query.
    pub state: QueryState<T>,
    /// Whether a fetch for this key is in flight.
    pub is_fetching: bool,
}

impl<T> QueryResult<T> {
    /// Returns the data if the query succeeded, otherwise `None`.
    pub const fn data(&self) -> Option<&T> {
        match &self.state {
            QueryState::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns the error if the query failed, otherwise `None`.
    pub const fn error(&self) -> Option<&AppError> {
        match &self.state {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if the query is loading without data.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Loading)
    }

    /// Returns `true` if the query has data.
    pub const fn is_success(&self) -> bool {
        matches!(self.state, QueryState::Success { .. })
    }

    /// Returns `true` if the query failed.
    pub const fn is_error(&self) -> bool {
        matches!(self.state, QueryState::Error(_))
    }

    /// Returns `true` if the query data is stale.
    pub const fn is_stale(&self) -> bool {
        matches!(self.state, QueryState::Success { is_stale: true, .. })
    }

    /// Converts a settled result into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the query's error, or `UNKNOWN_ERROR` if it has no data yet.
    pub fn into_result(self) -> Result<T, AppError> {
        match self.state {
            QueryState::Success { data, .. } => Ok(data),
            QueryState::Error(e) => Err(e),
            QueryState::Loading => Err(AppError::unknown("query has not produced data")),
        }
    }
}

impl<T: Clone + 'static> QueryResult<T> {
    fn from_snapshot(snapshot: &Snapshot, is_fetching: bool) -> Self {
        let state = match (snapshot.status, &snapshot.data, &snapshot.error) {
            (EntryStatus::Error, _, Some(error)) => QueryState::Error(error.clone()),
            (_, Some(data), _) => match data.downcast_ref::<T>() {
                Some(data) => QueryState::Success {
                    data: data.clone(),
                    is_stale: snapshot.is_stale,
                },
                None => QueryState::Error(AppError::unknown(
                    "cached value has a different type than requested",
                )),
            },
            _ => QueryState::Loading,
        };
        Self { state, is_fetching }
    }
}

/// Per-query options: static tags, result-derived tags and retention.
pub struct QueryOptions<V> {
    tags: Vec<Tag>,
    provides: Option<Provides<V>>,
    keep_unused_for: Option<Duration>,
}

impl<V> QueryOptions<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tags: Vec::new(),
            provides: None,
            keep_unused_for: None,
        }
    }

    /// Tags attached regardless of the fetch result.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Tags computed from a successful result, e.g. one `{Pet, id}` per pet.
    #[must_use]
    pub fn provides(mut self, f: impl Fn(&V) -> Vec<Tag> + Send + Sync + 'static) -> Self {
        self.provides = Some(Arc::new(f));
        self
    }

    /// Overrides the eviction grace period for this query.
    #[must_use]
    pub const fn keep_unused_for(mut self, grace: Duration) -> Self {
        self.keep_unused_for = Some(grace);
        self
    }

    /// Tags attached regardless of the result.
    #[must_use]
    pub fn static_tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Every tag an entry holding `value` is indexed under.
    #[must_use]
    pub fn tags_for(&self, value: &V) -> Vec<Tag> {
        let mut tags = self.tags.clone();
        if let Some(provides) = &self.provides {
            tags.extend(provides(value));
        }
        tags
    }

    /// The per-query grace period, if overridden.
    #[must_use]
    pub const fn retention(&self) -> Option<Duration> {
        self.keep_unused_for
    }
}

impl<V> Default for QueryOptions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for QueryOptions<V> {
    fn clone(&self) -> Self {
        Self {
            tags: self.tags.clone(),
            provides: self.provides.clone(),
            keep_unused_for: self.keep_unused_for,
        }
    }
}

/// A client for managing the query cache and tag invalidation.
///
/// The `QueryClient` is the central state manager for queries. It handles:
/// - Caching query results under a [`QueryKey`]
/// - Deduplicating concurrent fetches of the same key
/// - Indexing entries by [`Tag`] for invalidation
/// - Evicting entries a grace period after their last subscriber leaves
///
/// Cloning is cheap and every clone shares the same cache. Construct one
/// per application instance and hand clones to whoever needs it.
///
/// Fetching and eviction spawn tasks, so the client must be used from
/// within a Tokio runtime.
///
/// # Example
///
/// ```rust
/// use pawhub_sync::query::{QueryClient, QueryConfig};
/// use std::time::Duration;
///
/// let config = QueryConfig::new(
///     Duration::from_secs(30),  // stale_time
///     Duration::from_secs(300), // cache_time
/// );
///
/// let client = QueryClient::with_config(config);
/// assert!(client.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct QueryClient {
    entries: Arc<DashMap<QueryKey, CacheEntry>>,
    tag_index: Arc<DashMap<Tag, HashSet<QueryKey>>>,
    config: QueryConfig,
}

impl QueryClient {
    /// Creates a new query client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    /// Creates a new query client with the given configuration.
    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            tag_index: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Gets the query configuration.
    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribes to `key`, fetching it if it is missing or stale.
    ///
    /// Concurrent callers for the same key share a single fetch. The returned
    /// handle unsubscribes when dropped.
    ///
    /// The fetcher is called from the fetch future, never under a cache lock,
    /// so it may read this client. Fetches are spawned on the current tokio
    /// runtime; outside one they make progress only while a handle awaits
    /// them.
    pub fn query<V, F>(
        &self,
        key: QueryKey,
        tags: impl IntoIterator<Item = Tag>,
        fetcher: F,
    ) -> QueryHandle<V>
    where
        V: Clone + Send + Sync + 'static,
        F: Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync + 'static,
    {
        self.query_with(key, QueryOptions::new().tags(tags), fetcher)
    }

    /// Like [`query`](Self::query), with full [`QueryOptions`].
    pub fn query_with<V, F>(
        &self,
        key: QueryKey,
        options: QueryOptions<V>,
        fetcher: F,
    ) -> QueryHandle<V>
    where
        V: Clone + Send + Sync + 'static,
        F: Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync + 'static,
    {
        let QueryOptions {
            tags,
            provides,
            keep_unused_for,
        } = options;
        let fetcher = erase(fetcher, provides);

        let (rx, needs_fetch) = {
            let mut entry = self.entries.entry(key.clone()).or_insert_with(|| {
                CacheEntry::new(key.clone(), fetcher.clone(), self.config.notify_capacity)
            });
            entry.fetcher = fetcher;
            for tag in &tags {
                entry.static_tags.insert(tag.clone());
                entry.tags.insert(tag.clone());
            }
            if keep_unused_for.is_some() {
                entry.keep_unused_for = keep_unused_for;
            }
            entry.subscriber_count += 1;
            entry.eviction_generation += 1;
            (
                entry.notifier.subscribe(),
                entry.needs_fetch(self.config.stale_time),
            )
        };

        for tag in tags {
            self.tag_index.entry(tag).or_default().insert(key.clone());
        }

        if needs_fetch {
            self.start_fetch(&key);
        } else {
            tracing::trace!(key = %key, "serving query from cache");
        }

        QueryHandle {
            key,
            client: self.clone(),
            rx,
            _marker: PhantomData,
        }
    }

    /// Subscribes, waits for the result, and unsubscribes.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, normalized by the fetcher.
    pub async fn fetch<V, F>(
        &self,
        key: QueryKey,
        tags: impl IntoIterator<Item = Tag>,
        fetcher: F,
    ) -> Result<V, AppError>
    where
        V: Clone + Send + Sync + 'static,
        F: Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync + 'static,
    {
        self.query(key, tags, fetcher).settled().await
    }

    /// Marks every entry carrying any of `tags` as stale.
    ///
    /// Entries with subscribers are refetched immediately; entries without
    /// are refetched on their next subscription. An entry whose fetch is in
    /// flight gets exactly one follow-up fetch once it completes.
    ///
    /// Returns the affected keys.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<QueryKey> {
        let mut keys = BTreeSet::new();
        for tag in tags {
            if let Some(set) = self.tag_index.get(tag) {
                keys.extend(set.iter().cloned());
            }
        }

        for key in &keys {
            let refetch = {
                let Some(mut entry) = self.entries.get_mut(key) else {
                    continue;
                };
                entry.invalidated = true;
                if entry.in_flight.is_some() {
                    entry.refetch_pending = true;
                    false
                } else if entry.subscriber_count > 0 {
                    true
                } else {
                    entry.notify();
                    false
                }
            };
            if refetch {
                self.start_fetch(key);
            }
        }

        tracing::debug!(
            tags = %tags.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            affected = keys.len(),
            "invalidated tags"
        );
        keys.into_iter().collect()
    }

    /// Invalidates `tags` as a [`Command`] side effect that produces no messages.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// fn update(&mut self, msg: Message) -> Command<Message> {
    ///     match msg {
    ///         Message::InterestSubmitted(_) => self
    ///             .query_client
    ///             .invalidation(vec![Tag::new("Interest", "PENDING")]),
    ///     }
    /// }
    /// ```
    pub fn invalidation<Msg>(&self, tags: Vec<Tag>) -> Command<Msg>
    where
        Msg: Send + 'static,
    {
        let client = self.clone();
        Command::stream(
            futures::stream::once(async move {
                client.invalidate(&tags);
            })
            .filter_map(|()| async { None }),
        )
    }

    /// Releases one subscription of `key`.
    ///
    /// When the last subscriber leaves, the entry is evicted after the grace
    /// period unless someone subscribes again first. An in-flight fetch is
    /// not cancelled; its result is still cached.
    pub fn unsubscribe(&self, key: &QueryKey) {
        let (generation, grace) = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                return;
            };
            entry.subscriber_count = entry.subscriber_count.saturating_sub(1);
            if entry.subscriber_count > 0 {
                return;
            }
            entry.eviction_generation += 1;
            (
                entry.eviction_generation,
                entry.grace_period(self.config.cache_time),
            )
        };
        self.schedule_eviction(key, generation, grace);
    }

    /// Overwrites the cached value of an existing entry and notifies subscribers.
    ///
    /// Returns `false` if `key` is not cached.
    pub fn set_data<V>(&self, key: &QueryKey, value: V) -> bool
    where
        V: Clone + Send + Sync + 'static,
    {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.write(Arc::new(value));
        entry.notify();
        true
    }

    /// The cached value of `key`, if present and of type `V`.
    #[must_use]
    pub fn get_data<V>(&self, key: &QueryKey) -> Option<V>
    where
        V: Clone + 'static,
    {
        self.entries
            .get(key)
            .and_then(|entry| entry.data.as_ref()?.downcast_ref::<V>().cloned())
    }

    /// Read-only view of an entry.
    #[must_use]
    pub fn entry_info(&self, key: &QueryKey) -> Option<CacheEntryInfo> {
        self.entries
            .get(key)
            .map(|entry| entry.info(self.config.stale_time))
    }

    /// Keys currently indexed under `tag`, sorted.
    #[must_use]
    pub fn keys_for_tag(&self, tag: &Tag) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self
            .tag_index
            .get(tag)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn snapshot(&self, key: &QueryKey) -> Option<(Snapshot, bool)> {
        self.entries
            .get(key)
            .map(|entry| (entry.snapshot(), entry.in_flight.is_some()))
    }

    fn in_flight(&self, key: &QueryKey) -> Option<SharedFetch> {
        self.entries.get(key).and_then(|entry| entry.in_flight.clone())
    }

    /// Starts a fetch for `key` unless one is already in flight, and returns
    /// the shared future either way.
    fn start_fetch(&self, key: &QueryKey) -> Option<SharedFetch> {
        let mut entry = self.entries.get_mut(key)?;
        if let Some(fetch) = &entry.in_flight {
            return Some(fetch.clone());
        }

        // Invoked on first poll, after the shard guard is released, so the
        // fetcher may read the client.
        let fetcher = entry.fetcher.clone();
        let client = self.clone();
        let settle_key = key.clone();
        let fetch: SharedFetch = async move {
            let result = fetcher().await;
            client.settle(&settle_key, result)
        }
        .boxed()
        .shared();

        entry.in_flight = Some(fetch.clone());
        entry.status = EntryStatus::Loading;
        entry.notify();
        drop(entry);

        tracing::debug!(key = %key, "fetching query");
        // Fetches always run to completion, even if every subscriber leaves.
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(fetch.clone().map(|_| ()));
            }
            Err(_) => {
                tracing::warn!(key = %key, "no tokio runtime, fetch runs only while awaited");
            }
        }
        Some(fetch)
    }

    /// Applies a completed fetch to its entry.
    fn settle(&self, key: &QueryKey, result: Result<Fetched, AppError>) -> Result<Erased, AppError> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return result.map(|fetched| fetched.data);
        };

        entry.in_flight = None;
        let previous_tags = entry.tags.clone();
        let output = match result {
            Ok(Fetched { data, tags }) => {
                entry.succeed(data.clone(), tags);
                Ok(data)
            }
            Err(error) => {
                tracing::debug!(key = %key, code = %error.code, "query failed");
                entry.fail(error.clone());
                Err(error)
            }
        };

        let refetch = std::mem::take(&mut entry.refetch_pending);
        if refetch {
            entry.invalidated = true;
        }
        entry.notify();

        let subscribed = entry.subscriber_count > 0;
        let generation = entry.eviction_generation;
        let grace = entry.grace_period(self.config.cache_time);
        let current_tags = entry.tags.clone();
        drop(entry);

        self.reindex(key, &previous_tags, &current_tags);

        if refetch && subscribed {
            self.start_fetch(key);
        } else if !subscribed {
            self.schedule_eviction(key, generation, grace);
        }
        output
    }

    fn reindex(&self, key: &QueryKey, previous: &HashSet<Tag>, current: &HashSet<Tag>) {
        for tag in previous.difference(current) {
            self.unindex(key, tag);
        }
        for tag in current.difference(previous) {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    fn unindex(&self, key: &QueryKey, tag: &Tag) {
        if let Some(mut set) = self.tag_index.get_mut(tag) {
            set.remove(key);
        }
        self.tag_index.remove_if(tag, |_, set| set.is_empty());
    }

    fn schedule_eviction(&self, key: &QueryKey, generation: u64, grace: Duration) {
        if grace.is_zero() {
            self.evict_if_idle(key, generation);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let client = self.clone();
                let key = key.clone();
                runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    client.evict_if_idle(&key, generation);
                });
            }
            Err(_) => {
                tracing::warn!(key = %key, "no tokio runtime, eviction timer not started");
            }
        }
    }

    fn evict_if_idle(&self, key: &QueryKey, generation: u64) -> bool {
        let Some((key, entry)) = self.entries.remove_if(key, |_, entry| {
            entry.subscriber_count == 0
                && entry.eviction_generation == generation
                && entry.in_flight.is_none()
        }) else {
            return false;
        };

        for tag in &entry.tags {
            self.unindex(&key, tag);
        }
        tracing::debug!(key = %key, "evicted unused query");
        true
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

fn erase<V, F>(fetcher: F, provides: Option<Provides<V>>) -> ErasedFetcher
where
    V: Clone + Send + Sync + 'static,
    F: Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync + 'static,
{
    Arc::new(move || {
        let request = fetcher();
        let provides = provides.clone();
        async move {
            let value = request.await?;
            let tags = provides.map(|f| f(&value)).unwrap_or_default();
            Ok(Fetched {
                data: Arc::new(value) as Erased,
                tags,
            })
        }
        .boxed()
    })
}

/// A live subscription to one cached query.
///
/// Dropping the handle unsubscribes from the key.
pub struct QueryHandle<V> {
    key: QueryKey,
    client: QueryClient,
    rx: broadcast::Receiver<Snapshot>,
    _marker: PhantomData<fn() -> V>,
}

impl<V: Clone + 'static> QueryHandle<V> {
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The current state, read synchronously from the cache.
    #[must_use]
    pub fn current(&self) -> QueryResult<V> {
        self.client.snapshot(&self.key).map_or(
            QueryResult {
                state: QueryState::Loading,
                is_fetching: false,
            },
            |(snapshot, is_fetching)| QueryResult::from_snapshot(&snapshot, is_fetching),
        )
    }

    /// Discards queued notifications and returns the current state.
    pub fn sync(&mut self) -> QueryResult<V> {
        while self.rx.try_recv().is_ok() {}
        self.current()
    }

    /// Waits for the next state transition.
    ///
    /// Returns `None` once the entry is gone and no further updates can arrive.
    pub async fn next(&mut self) -> Option<QueryResult<V>> {
        match self.rx.recv().await {
            Ok(snapshot) => {
                let is_fetching = snapshot.status == EntryStatus::Loading;
                Some(QueryResult::from_snapshot(&snapshot, is_fetching))
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(key = %self.key, skipped, "query subscriber lagged");
                self.rx = self.rx.resubscribe();
                Some(self.current())
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Waits until no fetch is in flight for this key and returns the result.
    ///
    /// # Errors
    ///
    /// Returns the query's error, or `UNKNOWN_ERROR` if the entry has no data.
    pub async fn settled(&mut self) -> Result<V, AppError> {
        while let Some(fetch) = self.client.in_flight(&self.key) {
            // The outcome is applied to the entry by the fetch itself; a
            // follow-up fetch may start, so check again.
            let _ = fetch.await;
        }
        while self.rx.try_recv().is_ok() {}
        self.current().into_result()
    }
}

impl<V> Drop for QueryHandle<V> {
    fn drop(&mut self) {
        self.client.unsubscribe(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_fetcher(
        calls: &Arc<AtomicUsize>,
        value: i32,
    ) -> impl Fn() -> BoxFuture<'static, Result<i32, AppError>> + Send + Sync + 'static {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        }
    }

    #[test]
    fn test_query_result_predicates() {
        let loading: QueryResult<i32> = QueryResult {
            state: QueryState::Loading,
            is_fetching: true,
        };
        assert!(loading.is_loading());
        assert!(!loading.is_success());
        assert_eq!(loading.data(), None);

        let stale = QueryResult {
            state: QueryState::Success {
                data: 42,
                is_stale: true,
            },
            is_fetching: false,
        };
        assert!(stale.is_success());
        assert!(stale.is_stale());
        assert_eq!(stale.data(), Some(&42));

        let error: QueryResult<i32> = QueryResult {
            state: QueryState::Error(AppError::timeout()),
            is_fetching: false,
        };
        assert!(error.is_error());
        assert_eq!(error.error().map(|e| e.code.to_string()), Some("TIMEOUT_ERROR".to_string()));
    }

    #[test]
    fn test_query_client_new() {
        let client = QueryClient::new();
        assert_eq!(client.len(), 0);
        assert_eq!(client.config().stale_time, Duration::MAX);
    }

    #[tokio::test]
    async fn test_query_fetches_and_caches() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let value = client
            .fetch(QueryKey::from("answer"), [], counting_fetcher(&calls, 42))
            .await
            .expect("fetch should succeed");
        assert_eq!(value, 42);

        // Fresh entry is served from the cache
        let handle = client.query(QueryKey::from("answer"), [], counting_fetcher(&calls, 7));
        assert_eq!(handle.current().data(), Some(&42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_fetch() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut a = client.query(QueryKey::from("k"), [], counting_fetcher(&calls, 1));
        let mut b = client.query(QueryKey::from("k"), [], counting_fetcher(&calls, 2));

        let (ra, rb) = tokio::join!(a.settled(), b.settled());
        assert_eq!(ra.expect("a should settle"), 1);
        assert_eq!(rb.expect("b should settle"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_refetches_subscribed_entry() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handle = client.query(
            QueryKey::from("pets"),
            [Tag::list("Pet")],
            counting_fetcher(&calls, 3),
        );
        handle.settled().await.expect("initial fetch");

        let affected = client.invalidate(&[Tag::list("Pet")]);
        assert_eq!(affected, vec![QueryKey::from("pets")]);

        handle.settled().await.expect("refetch");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_unsubscribed_entry_is_lazy() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        client
            .fetch(QueryKey::from("pet-42"), [Tag::new("Pet", "42")], counting_fetcher(&calls, 42))
            .await
            .expect("fetch");
        client.invalidate(&[Tag::new("Pet", "42")]);

        let info = client
            .entry_info(&QueryKey::from("pet-42"))
            .expect("entry retained during grace period");
        assert!(info.is_stale);
        assert!(!info.is_fetching);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Next subscription refetches
        client
            .fetch(QueryKey::from("pet-42"), [Tag::new("Pet", "42")], counting_fetcher(&calls, 42))
            .await
            .expect("refetch");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_provided_tags_are_indexed() {
        let client = QueryClient::new();
        let handle = client.query_with(
            QueryKey::from("list"),
            QueryOptions::new()
                .tags([Tag::list("Pet")])
                .provides(|ids: &Vec<String>| ids.iter().map(|id| Tag::new("Pet", id.clone())).collect()),
            || async { Ok(vec!["1".to_string(), "2".to_string()]) }.boxed(),
        );
        let mut handle = handle;
        handle.settled().await.expect("fetch");

        assert_eq!(client.keys_for_tag(&Tag::new("Pet", "2")), vec![QueryKey::from("list")]);
        assert_eq!(client.keys_for_tag(&Tag::list("Pet")), vec![QueryKey::from("list")]);
    }

    #[tokio::test]
    async fn test_zero_grace_evicts_on_unsubscribe() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handle = client.query_with(
            QueryKey::from("whatsapp"),
            QueryOptions::new()
                .tags([Tag::new("Interest", "1")])
                .keep_unused_for(Duration::ZERO),
            counting_fetcher(&calls, 1),
        );
        handle.settled().await.expect("fetch");
        drop(handle);

        assert!(client.entry_info(&QueryKey::from("whatsapp")).is_none());
        assert!(client.keys_for_tag(&Tag::new("Interest", "1")).is_empty());
    }

    #[tokio::test]
    async fn test_set_data_notifies() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handle = client.query(QueryKey::from("n"), [], counting_fetcher(&calls, 1));
        handle.settled().await.expect("fetch");

        assert!(client.set_data(&QueryKey::from("n"), 99_i32));
        let update = handle.next().await.expect("update should be delivered");
        assert_eq!(update.data(), Some(&99));
        assert_eq!(client.get_data::<i32>(&QueryKey::from("n")), Some(99));
        assert!(!client.set_data(&QueryKey::from("missing"), 1_i32));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_error() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));
        client
            .fetch(QueryKey::from("x"), [], counting_fetcher(&calls, 1))
            .await
            .expect("fetch");

        let handle: QueryHandle<String> =
            client.query(QueryKey::from("x"), [], || async { Ok("x".to_string()) }.boxed());
        assert!(handle.current().is_error());
    }

    #[tokio::test]
    async fn test_fetcher_may_read_client() {
        let client = QueryClient::new();
        client
            .fetch(QueryKey::from("seed"), [], || async { Ok(5_i32) }.boxed())
            .await
            .expect("seed should load");
        let mut seed = client.query(QueryKey::from("seed"), [], || async { Ok(5_i32) }.boxed());
        assert_eq!(seed.current().data(), Some(&5));

        let reader = client.clone();
        let doubled = tokio::time::timeout(
            Duration::from_secs(5),
            client.fetch(QueryKey::from("doubled"), [], move || {
                let seeded = reader.get_data::<i32>(&QueryKey::from("seed")).unwrap_or(0);
                let fetching = reader
                    .entry_info(&QueryKey::from("doubled"))
                    .is_some_and(|info| info.is_fetching);
                async move {
                    assert!(fetching);
                    Ok(seeded * 2)
                }
                .boxed()
            }),
        )
        .await
        .expect("fetch should not block on the cache")
        .expect("fetch should succeed");

        assert_eq!(doubled, 10);
        assert_eq!(seed.settled().await.expect("seed cached"), 5);
    }

    #[test]
    fn test_fetch_without_runtime() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let value = futures::executor::block_on(client.fetch(
            QueryKey::from("offline"),
            [],
            counting_fetcher(&calls, 3),
        ))
        .expect("awaiting drives the fetch");

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            client.entry_info(&QueryKey::from("offline")).map(|i| i.status),
            Some(EntryStatus::Success)
        );
    }

    #[tokio::test]
    async fn test_invalidation_command_produces_no_messages() {
        let client = QueryClient::new();
        let cmd: Command<()> = client.invalidation(vec![Tag::list("Pet")]);

        let stream = cmd
            .into_stream()
            .expect("invalidation should produce a command with a stream");
        let messages: Vec<_> = stream.collect().await;
        assert!(messages.is_empty());
    }
}
