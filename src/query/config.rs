use std::time::Duration;

/// Configuration for query cache behavior.
///
/// This controls when cached data is considered stale and how long unused
/// entries survive after their last subscriber leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long data is considered fresh after a successful fetch.
    ///
    /// While fresh, new subscribers are served from the cache without a fetch.
    /// Once stale, the cached data is still shown but a new subscriber
    /// triggers a background revalidation.
    pub stale_time: Duration,

    /// Grace period an entry is retained after its subscriber count drops to zero.
    ///
    /// If nobody subscribes again within this window the entry is evicted.
    pub cache_time: Duration,

    /// Capacity of each entry's notification channel.
    pub notify_capacity: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::MAX,               // fresh until invalidated
            cache_time: Duration::from_secs(5 * 60), // 5 minutes
            notify_capacity: 64,
        }
    }
}

impl QueryConfig {
    /// Creates a new query configuration with the given stale and cache times.
    #[must_use]
    pub const fn new(stale_time: Duration, cache_time: Duration) -> Self {
        Self {
            stale_time,
            cache_time,
            notify_capacity: 64,
        }
    }
}
