//! Tagged query cache with request deduplication and delayed eviction.
//!
//! Every cached response lives under a [`QueryKey`] derived from the endpoint
//! and its parameters. Entries carry [`Tag`]s; invalidating a tag marks every
//! entry carrying it stale and refetches the ones somebody is still watching.
//!
//! # Lifecycle
//!
//! 1. The first subscriber of a key starts a fetch. Later subscribers of the
//!    same key attach to the in-flight fetch instead of starting another.
//! 2. A successful fetch stores the value and tags; a failed fetch stores the
//!    error and keeps any previous value.
//! 3. When the last subscriber leaves, the entry is kept for the grace period
//!    (`cache_time`, or the query's own override) and then evicted unless it
//!    was subscribed again in the meantime.
//!
//! # Example
//!
//! ```rust
//! use futures::FutureExt;
//! use pawhub_sync::query::{QueryClient, QueryKey, Tag};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), pawhub_sync::AppError> {
//! let client = QueryClient::new();
//!
//! let count = client
//!     .fetch(QueryKey::from("pet-count"), [Tag::list("Pet")], || {
//!         async { Ok(42_u64) }.boxed()
//!     })
//!     .await?;
//! assert_eq!(count, 42);
//!
//! let affected = client.invalidate(&[Tag::list("Pet")]);
//! assert_eq!(affected, vec![QueryKey::from("pet-count")]);
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod config;
mod key;
mod source;
mod tag;

pub use cache::{CacheEntryInfo, EntryStatus};
pub use client::{QueryClient, QueryHandle, QueryOptions, QueryResult, QueryState};
pub use config::QueryConfig;
pub use key::QueryKey;
pub use source::Query;
pub use tag::{Tag, TagId};
