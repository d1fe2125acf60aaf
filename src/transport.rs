//! Single-attempt HTTP primitive.
//!
//! A [`Transport`] sends one [`Request`] and classifies the result into an
//! [`Outcome`]. It never retries and never fails with a Rust error for the
//! expected failure classes: network failures, timeouts and non-2xx statuses
//! are all ordinary outcomes. Retrying is layered on top by
//! [`RetryPolicy`](crate::retry::RetryPolicy).
//!
//! Two implementations are provided:
//!
//! - [`HttpTransport`]: real network I/O through `reqwest`
//! - [`MockTransport`]: scripted outcomes for tests and demos

mod http;
pub mod mock;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

pub use http::HttpTransport;
pub use mock::MockTransport;

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request relative to the API root (base URL plus version prefix).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path below the versioned prefix, e.g. `/pets/42`.
    pub path: String,
    /// Query parameters, kept sorted so equal requests compare equal.
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    /// Extra headers applied on top of the transport defaults.
    pub headers: Vec<(String, String)>,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
}

impl Request {
    /// Creates a request with no parameters or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Adds a query parameter, replacing any previous value for `key`.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    /// Adds a query parameter only when `value` is present.
    #[must_use]
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Adds every parameter from an iterator of pairs.
    #[must_use]
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if `body` cannot be represented as JSON.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Classified result of a single transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx response.
    Ok { status: u16, body: Value },
    /// Non-2xx response.
    HttpError { status: u16, body: Value },
    /// No response was received.
    NetworkError { message: String },
    /// The deadline elapsed before a response arrived.
    TimeoutError,
}

impl Outcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The HTTP status, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Ok { status, .. } | Self::HttpError { status, .. } => Some(*status),
            Self::NetworkError { .. } | Self::TimeoutError => None,
        }
    }

    /// Returns `true` when the request never produced a response.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::TimeoutError)
    }

    /// Returns `true` for a 5xx response.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::HttpError { status, .. } if *status >= 500)
    }
}

/// A single-attempt request executor.
///
/// Returned futures are `'static` so they can be shared between concurrent
/// callers and spawned onto the runtime.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> BoxFuture<'static, Outcome>;
}
