//! Typed facade over the transport, retry policy, query cache and mutation
//! executor, plus the marketplace endpoint catalog.
//!
//! Endpoints are plain values: a [`QueryEndpoint`] describes a request, how to
//! decode it and which tags it provides; a [`MutationEndpoint`] describes a
//! write and which tags it invalidates. [`ApiClient`] runs them.
//!
//! # Example
//!
//! ```rust,no_run
//! use pawhub_sync::api::{ApiClient, interests, pets};
//! use pawhub_sync::config::ApiConfig;
//! use pawhub_sync::models::PetSearchParams;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new(ApiConfig::from_env()?)?;
//!
//! let page = api.fetch(pets::list(&PetSearchParams::default())).await?;
//! println!("{} pets", page.meta.total);
//!
//! let pending = api.query(interests::pending(None));
//! # drop(pending);
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod breeders;
pub mod categories;
pub mod health;
pub mod interests;
pub mod pets;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use percent_encoding::{AsciiSet, CONTROLS, PercentEncode, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::command::Command;
use crate::config::ApiConfig;
use crate::envelope::{Paginated, normalize, normalize_page};
use crate::error::AppError;
use crate::mutation::MutationExecutor;
use crate::query::{Query, QueryClient, QueryHandle, QueryKey, QueryOptions, Tag};
use crate::retry::{RetryMode, RetryPolicy};
use crate::transport::{HttpTransport, Outcome, Request, Transport};

type Decoder<V> = fn(Outcome) -> Result<V, AppError>;

/// A cacheable read.
pub struct QueryEndpoint<V> {
    request: Request,
    options: QueryOptions<V>,
    decode: Decoder<V>,
}

impl<V> QueryEndpoint<V> {
    /// An endpoint decoded with a custom function.
    pub fn new(request: Request, decode: Decoder<V>) -> Self {
        Self {
            request,
            options: QueryOptions::new(),
            decode,
        }
    }

    /// Tags attached regardless of the result.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.options = self.options.tags(tags);
        self
    }

    /// Tags derived from a successful result.
    #[must_use]
    pub fn provides(mut self, f: impl Fn(&V) -> Vec<Tag> + Send + Sync + 'static) -> Self {
        self.options = self.options.provides(f);
        self
    }

    /// Grace period before an unused result is evicted.
    #[must_use]
    pub fn keep_unused_for(mut self, grace: Duration) -> Self {
        self.options = self.options.keep_unused_for(grace);
        self
    }

    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Tags, provided tags and retention of this endpoint.
    #[must_use]
    pub const fn options(&self) -> &QueryOptions<V> {
        &self.options
    }

    /// The cache key this endpoint is stored under.
    #[must_use]
    pub fn key(&self) -> QueryKey {
        QueryKey::from_request(&self.request)
    }
}

impl<V: DeserializeOwned> QueryEndpoint<V> {
    /// An endpoint whose envelope `data` decodes into `V`.
    pub fn single(request: Request) -> Self {
        Self::new(request, normalize::<V>)
    }
}

impl<T: DeserializeOwned> QueryEndpoint<Paginated<T>> {
    /// A paginated list endpoint (`data` array plus `meta`).
    pub fn page(request: Request) -> Self {
        Self::new(request, normalize_page::<T>)
    }
}

/// A write that invalidates tags on success.
pub struct MutationEndpoint<T> {
    request: Request,
    invalidates: Vec<Tag>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MutationEndpoint<T> {
    pub fn new(request: Request, invalidates: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            request,
            invalidates: invalidates.into_iter().collect(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn invalidates(&self) -> &[Tag] {
        &self.invalidates
    }
}

/// Bytes escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encodes an id for use as one path segment.
pub(crate) fn segment(id: &str) -> PercentEncode<'_> {
    utf8_percent_encode(id, SEGMENT)
}

/// Attaches `body` as the JSON request body.
pub(crate) fn with_json(request: Request, body: &impl Serialize) -> Result<Request, AppError> {
    request
        .json(body)
        .map_err(|e| AppError::unknown(format!("cannot encode request body: {e}")))
}

/// Entry point for every read and write against the marketplace API.
///
/// Cloning is cheap; clones share the transport and the cache.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    cache: QueryClient,
    mutations: MutationExecutor,
}

impl ApiClient {
    /// A client talking HTTP to `config.api_root()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// A client using an arbitrary transport, e.g. a
    /// [`MockTransport`](crate::transport::MockTransport).
    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = RetryPolicy::from_config(&config);
        let cache = QueryClient::with_config(config.query);
        let mutations = MutationExecutor::new(transport.clone(), retry, cache.clone())
            .with_error_logging(config.environment.logs_request_errors());
        tracing::debug!(
            root = %config.api_root(),
            environment = %config.environment,
            max_attempts = retry.max_attempts(),
            "api client ready"
        );
        Self {
            config,
            transport,
            retry,
            cache,
            mutations,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The query cache backing this client.
    #[must_use]
    pub const fn cache(&self) -> &QueryClient {
        &self.cache
    }

    /// Subscribes to an endpoint. See [`QueryClient::query`].
    pub fn query<V>(&self, endpoint: QueryEndpoint<V>) -> QueryHandle<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let key = endpoint.key();
        let QueryEndpoint {
            request,
            options,
            decode,
        } = endpoint;
        self.cache
            .query_with(key, options, self.fetcher(request, decode))
    }

    /// Fetches an endpoint through the cache and waits for the result.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the final attempt.
    pub async fn fetch<V>(&self, endpoint: QueryEndpoint<V>) -> Result<V, AppError>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.query(endpoint).settled().await
    }

    /// An endpoint as a subscription source.
    pub fn source<V>(&self, endpoint: QueryEndpoint<V>) -> Query<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let key = endpoint.key();
        let QueryEndpoint {
            request,
            options,
            decode,
        } = endpoint;
        Query::new(
            key,
            options,
            self.fetcher(request, decode),
            self.cache.clone(),
        )
    }

    /// Runs a write and invalidates its tags on success.
    ///
    /// # Errors
    ///
    /// Returns the normalized error; the cache is left untouched.
    pub async fn mutate<T>(&self, endpoint: MutationEndpoint<T>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        self.mutations
            .mutate(endpoint.request, &endpoint.invalidates)
            .await
    }

    /// [`mutate`](Self::mutate) as a [`Command`].
    pub fn mutation_command<T, Msg>(
        &self,
        endpoint: MutationEndpoint<T>,
        f: impl FnOnce(Result<T, AppError>) -> Msg + Send + 'static,
    ) -> Command<Msg>
    where
        T: DeserializeOwned + Send + 'static,
        Msg: Send + 'static,
    {
        self.mutations
            .command(endpoint.request, endpoint.invalidates, f)
    }

    fn fetcher<V>(
        &self,
        request: Request,
        decode: Decoder<V>,
    ) -> impl Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync + 'static
    where
        V: Send + 'static,
    {
        let transport = self.transport.clone();
        let retry = self.retry;
        let log_errors = self.config.environment.logs_request_errors();
        let request = Arc::new(request);

        move || {
            let transport = transport.clone();
            let request = request.clone();
            async move {
                let outcome = retry
                    .execute(RetryMode::Query, || transport.send(&request))
                    .await;
                let result = decode(outcome);
                if log_errors && let Err(error) = &result {
                    tracing::error!(request = %request, code = %error.code, message = %error.message, "request failed");
                }
                result
            }
            .boxed()
        }
    }
}

/// Tags `{kind, id}` for every item of a list.
pub(crate) fn item_tags<T>(kind: &str, items: &[T], id: impl Fn(&T) -> &str) -> Vec<Tag> {
    items.iter().map(|item| Tag::new(kind, id(item))).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Environment;
    use crate::transport::{Method, MockTransport};

    fn client(mock: &MockTransport) -> ApiClient {
        let mut config = ApiConfig::for_environment(Environment::Development);
        config.retry_base_delay = Duration::from_millis(1);
        ApiClient::with_transport(config, Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_fetch_decodes_envelope() {
        let mock = MockTransport::new();
        mock.respond_ok(Method::Get, "/ping", json!({ "ok": true }));

        let value: serde_json::Value = client(&mock)
            .fetch(QueryEndpoint::single(Request::get("/ping")))
            .await
            .expect("fetch should succeed");
        assert_eq!(value, json!({ "ok": true }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_retries_server_errors() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/ping", Outcome::HttpError {
            status: 503,
            body: json!({}),
        });
        mock.respond_ok(Method::Get, "/ping", json!(1));

        let value: u32 = client(&mock)
            .fetch(QueryEndpoint::single(Request::get("/ping")))
            .await
            .expect("second attempt should succeed");
        assert_eq!(value, 1);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_endpoint_key_matches_request() {
        let endpoint: QueryEndpoint<u32> =
            QueryEndpoint::single(Request::get("/pets").param("page", 2));
        assert_eq!(endpoint.key().as_str(), r#"GET /pets {"page":"2"}"#);
    }

    #[test]
    fn test_item_tags() {
        let ids = ["1".to_string(), "2".to_string()];
        assert_eq!(
            item_tags("Pet", &ids, String::as_str),
            vec![Tag::new("Pet", "1"), Tag::new("Pet", "2")]
        );
    }
}
