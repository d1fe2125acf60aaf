//! Scripted transport for testing.
//!
//! This module provides a controllable [`Transport`] that answers from a
//! script instead of the network, enabling deterministic tests of caching,
//! retry and invalidation without real I/O.
//!
//! # Basic Usage
//!
//! ```
//! use pawhub_sync::transport::{MockTransport, Method, Outcome};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.respond_ok(Method::Get, "/pets/42", json!({ "id": "42", "name": "Rex" }));
//! mock.on(Method::Get, "/pets/404", Outcome::HttpError { status: 404, body: json!({}) });
//!
//! assert_eq!(mock.call_count(), 0);
//! ```
//!
//! Each route keeps a queue of outcomes. Outcomes are consumed in order and
//! the last one is repeated once the queue is down to a single entry, so a
//! route scripted with `[NetworkError, Ok]` fails once and then succeeds
//! forever.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tokio::time::Instant;

use super::{Method, Outcome, Request, Transport};

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: Request,
    /// Time the attempt started, on the tokio clock.
    pub at: Instant,
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    outcomes: VecDeque<Outcome>,
}

#[derive(Debug, Default)]
struct MockState {
    routes: Vec<Route>,
    calls: Vec<RecordedCall>,
    latency: Duration,
}

/// A transport that replies from scripted outcomes and records every call.
///
/// Cloning shares the script and the call log, so a clone can be handed to
/// the code under test while the test keeps one for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Appends an outcome to the script for `method path`.
    pub fn on(&self, method: Method, path: &str, outcome: Outcome) -> &Self {
        let mut state = self.lock();
        if let Some(route) = state
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            route.outcomes.push_back(outcome);
        } else {
            state.routes.push(Route {
                method,
                path: path.to_string(),
                outcomes: VecDeque::from([outcome]),
            });
        }
        self
    }

    /// Appends a `200` success envelope wrapping `data`.
    pub fn respond_ok(&self, method: Method, path: &str, data: Value) -> &Self {
        self.on(method, path, Outcome::Ok {
            status: 200,
            body: json!({ "success": true, "data": data }),
        })
    }

    /// Appends a `200` paginated success envelope.
    pub fn respond_page(&self, method: Method, path: &str, items: Value, total: u64) -> &Self {
        let count = items.as_array().map_or(0, Vec::len) as u64;
        let limit = count.max(1);
        self.on(method, path, Outcome::Ok {
            status: 200,
            body: json!({
                "success": true,
                "data": items,
                "meta": {
                    "total": total,
                    "page": 1,
                    "limit": limit,
                    "pages": total.div_ceil(limit),
                },
            }),
        })
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Total number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of calls made to `method path`.
    #[must_use]
    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.request.method == method && c.request.path == path)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_outcome(&self, request: &Request) -> (Outcome, Duration) {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            request: request.clone(),
            at: Instant::now(),
        });
        let latency = state.latency;

        let outcome = state
            .routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == request.path)
            .and_then(|route| {
                if route.outcomes.len() > 1 {
                    route.outcomes.pop_front()
                } else {
                    route.outcomes.front().cloned()
                }
            })
            .unwrap_or_else(|| Outcome::HttpError {
                status: 404,
                body: json!({
                    "success": false,
                    "message": format!("no mock route for {} {}", request.method, request.path),
                }),
            });

        (outcome, latency)
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Request) -> BoxFuture<'static, Outcome> {
        let (outcome, latency) = self.next_outcome(request);
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/pets", Outcome::TimeoutError);
        mock.respond_ok(Method::Get, "/pets", json!([]));

        let request = Request::get("/pets");
        assert_eq!(mock.send(&request).await, Outcome::TimeoutError);
        assert!(mock.send(&request).await.is_ok());
        // Last outcome repeats
        assert!(mock.send(&request).await.is_ok());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let mock = MockTransport::new();
        let outcome = mock.send(&Request::get("/missing")).await;
        assert_eq!(outcome.status(), Some(404));
    }

    #[tokio::test]
    async fn test_calls_to_filters_by_route() {
        let mock = MockTransport::new();
        mock.respond_ok(Method::Get, "/pets", json!([]));
        mock.respond_ok(Method::Post, "/interests/submit", json!({ "id": "1" }));

        let _ = mock.send(&Request::get("/pets")).await;
        let _ = mock.send(&Request::get("/pets")).await;
        let _ = mock.send(&Request::post("/interests/submit")).await;

        assert_eq!(mock.calls_to(Method::Get, "/pets"), 2);
        assert_eq!(mock.calls_to(Method::Post, "/interests/submit"), 1);
    }

    #[test]
    fn test_clone_shares_log() {
        let mock1 = MockTransport::new();
        let mock2 = mock1.clone();
        mock1.respond_ok(Method::Get, "/pets", json!([]));

        let _ = mock2.next_outcome(&Request::get("/pets"));
        assert_eq!(mock1.call_count(), 1);
    }
}
