//! Long-lived sources of messages.
//!
//! A [`SubscriptionSource`] produces a stream of values for as long as it is
//! polled. [`Subscription`] wraps a source together with a message mapping so
//! view code can subscribe to cached queries and navigation events in the
//! same shape as one-shot [`Command`](crate::command::Command)s.

use std::any::TypeId;
use std::fmt;

use futures::StreamExt;
use futures::stream::BoxStream;

/// Identity of a subscription, used to tell whether two subscriptions watch
/// the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    type_id: TypeId,
    hash: u64,
}

impl SubscriptionId {
    /// Builds an id from the source type and a hash of its identifying fields.
    #[must_use]
    pub fn of<T: 'static>(hash: u64) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            hash,
        }
    }
}

/// A source of values that can be consumed as a stream.
pub trait SubscriptionSource: Send + 'static {
    /// The type of values produced.
    type Output;

    /// Creates the stream of values. Each call starts an independent stream.
    fn stream(&self) -> BoxStream<'static, Self::Output>;

    /// Identity of this source.
    fn id(&self) -> SubscriptionId;
}

/// A subscription producing messages of type `Msg`.
pub struct Subscription<Msg> {
    id: SubscriptionId,
    spawn: Box<dyn FnOnce() -> BoxStream<'static, Msg> + Send>,
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// Wraps a source.
    pub fn new<S>(source: S) -> Self
    where
        S: SubscriptionSource<Output = Msg>,
    {
        Self {
            id: source.id(),
            spawn: Box::new(move || source.stream()),
        }
    }

    /// Maps every produced value to another message type.
    #[must_use]
    pub fn map<T, F>(self, f: F) -> Subscription<T>
    where
        T: Send + 'static,
        F: Fn(Msg) -> T + Send + 'static,
    {
        let spawn = self.spawn;
        Subscription {
            id: self.id,
            spawn: Box::new(move || spawn().map(f).boxed()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Starts the underlying stream.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, Msg> {
        (self.spawn)()
    }
}

impl<Msg> fmt::Debug for Subscription<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
