use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::AppError;

use super::{Method, Outcome, Request, Transport};

/// [`Transport`] backed by a shared `reqwest::Client`.
///
/// Applies the JSON default headers and the configured wall-clock timeout to
/// every request. URLs are built as `base_url + api_prefix + request.path`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    root: String,
}

impl HttpTransport {
    /// Builds a transport from the API configuration.
    ///
    /// # Errors
    ///
    /// Returns an `UNKNOWN_ERROR` if the underlying HTTP client cannot be
    /// constructed (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            root: config.api_root(),
        })
    }

    /// The absolute URL for a path below the API root.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

const fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> BoxFuture<'static, Outcome> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), self.url_for(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => tracing::warn!(header = %name, "skipping invalid request header"),
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let label = request.to_string();
        async move {
            tracing::debug!(request = %label, "sending request");
            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => return classify_error(&label, &e),
            };

            // The server has answered, so the request may have been applied.
            // A broken body never becomes a retryable transport failure.
            let status = response.status().as_u16();
            let body = match response.bytes().await {
                Ok(bytes) => parse_body(&bytes),
                Err(e) => {
                    tracing::warn!(
                        request = %label,
                        status,
                        error = %e,
                        "response body could not be read"
                    );
                    Value::Null
                }
            };

            if (200..300).contains(&status) {
                Outcome::Ok { status, body }
            } else {
                tracing::debug!(request = %label, status, "request returned error status");
                Outcome::HttpError { status, body }
            }
        }
        .boxed()
    }
}

fn classify_error(label: &str, error: &reqwest::Error) -> Outcome {
    if error.is_timeout() {
        tracing::debug!(request = %label, "request timed out");
        Outcome::TimeoutError
    } else {
        tracing::debug!(request = %label, error = %error, "request failed without response");
        Outcome::NetworkError {
            message: error.to_string(),
        }
    }
}

/// Parses a response body as JSON, preserving non-JSON text as a string.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
