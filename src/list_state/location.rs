use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::form_urlencoded;

/// A path plus its raw query string, without the leading `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: String,
    pub query: String,
}

impl Location {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }

    /// Splits `path?query`. A fragment is dropped.
    #[must_use]
    pub fn parse(href: &str) -> Self {
        let href = href.split_once('#').map_or(href, |(before, _)| before);
        match href.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(href, ""),
        }
    }

    /// Decoded query pairs in URL order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Builds a location from decoded pairs.
    pub fn from_pairs<K, V>(path: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self::new(path, query)
    }

    /// First decoded value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query)
        }
    }
}

/// A history replacement requested by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub location: Location,
    /// Whether the page should scroll to the top. Always `false` for list
    /// state changes.
    pub scroll: bool,
}

/// The router the synchronizer writes to.
pub trait Navigator: Send + Sync {
    /// Replaces the current history entry.
    fn replace(&self, navigation: Navigation);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn replace(&self, navigation: Navigation) {
        (**self).replace(navigation);
    }
}

/// Records every replacement. Useful in tests and headless front ends.
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    history: Arc<Mutex<Vec<Navigation>>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All replacements so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Navigation> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Navigation> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Navigator for MemoryNavigator {
    fn replace(&self, navigation: Navigation) {
        tracing::trace!(location = %navigation.location, "replace");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(navigation);
    }
}

/// Forwards each replacement over a channel, for a router running elsewhere.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Navigation>,
}

impl ChannelNavigator {
    /// Returns the navigator and the stream of navigations it emits.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiverStream<Navigation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }
}

impl Navigator for ChannelNavigator {
    fn replace(&self, navigation: Navigation) {
        if self.tx.send(navigation).is_err() {
            tracing::debug!("navigation receiver dropped");
        }
    }
}
