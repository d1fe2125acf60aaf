use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};

use crate::error::AppError;
use crate::subscription::{SubscriptionId, SubscriptionSource};

use super::client::{QueryClient, QueryHandle, QueryOptions, QueryResult};
use super::key::QueryKey;

type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync>;

/// A cached query as a subscription.
///
/// The stream first yields the current state of the entry (triggering a fetch
/// when it is missing or stale), then one result per state transition until
/// the stream is dropped, which releases the subscription.
///
/// # Example
///
/// ```rust,ignore
/// use pawhub_sync::prelude::*;
///
/// fn subscriptions(&self) -> Vec<Subscription<Message>> {
///     vec![
///         Subscription::new(self.api.source(pets::featured(Some(8))))
///             .map(Message::FeaturedPets),
///     ]
/// }
/// ```
pub struct Query<V> {
    key: QueryKey,
    options: QueryOptions<V>,
    fetcher: Fetcher<V>,
    client: QueryClient,
}

impl<V> Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new<F>(key: QueryKey, options: QueryOptions<V>, fetcher: F, client: QueryClient) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync + 'static,
    {
        Self {
            key,
            options,
            fetcher: Arc::new(fetcher),
            client,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    fn subscribe(&self) -> QueryHandle<V> {
        let fetcher = self.fetcher.clone();
        self.client
            .query_with(self.key.clone(), self.options.clone(), move || fetcher())
    }
}

impl<V> Clone for Query<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            options: self.options.clone(),
            fetcher: self.fetcher.clone(),
            client: self.client.clone(),
        }
    }
}

enum State<V> {
    Initial,
    Watching(QueryHandle<V>),
}

impl<V> SubscriptionSource for Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = QueryResult<V>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        let query = self.clone();

        stream::unfold(State::Initial, move |state| {
            let (handle, initial) = match state {
                State::Initial => (query.subscribe(), true),
                State::Watching(handle) => (handle, false),
            };

            async move {
                let mut handle = handle;
                let result = if initial {
                    handle.sync()
                } else {
                    handle.next().await?
                };
                Some((result, State::Watching(handle)))
            }
        })
        .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.key.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}
