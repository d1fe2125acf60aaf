//! # pawhub-sync - client-side data sync for the PawHub marketplace
//!
//! `pawhub-sync` sits between a front end and the PawHub REST API. It
//! fetches, caches, deduplicates and invalidates server data, and keeps
//! listing view state (filters, sort, pagination) in the page URL.
//!
//! ## Layers
//!
//! 1. **Transport**: one request, one [`Outcome`](transport::Outcome); no retries
//! 2. **Retry**: bounded exponential backoff around the transport
//! 3. **Envelope**: turns an outcome into typed data or an [`AppError`]
//! 4. **Query cache**: keyed, tagged, deduplicated server state with
//!    grace-period eviction
//! 5. **Mutations**: writes that invalidate tags on success
//! 6. **List state**: URL-backed filters, sort and pagination
//!
//! ## Core Components
//!
//! - [`ApiClient`](api::ApiClient): the facade wiring every layer together
//! - [`QueryClient`](query::QueryClient): the query cache
//! - [`MutationExecutor`](mutation::MutationExecutor): mutations with invalidation
//! - [`ListStateSync`](list_state::ListStateSync): URL to view state and back
//! - [`Command`](command::Command) and [`Subscription`](subscription::Subscription):
//!   message-driven adapters for Elm-style front ends
//!
//! ## Example
//!
//! ```rust,no_run
//! use pawhub_sync::api::{ApiClient, pets};
//! use pawhub_sync::config::ApiConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! pawhub_sync::logging::init();
//!
//! let api = ApiClient::new(ApiConfig::from_env()?)?;
//! let featured = api.fetch(pets::featured(None)).await?;
//! println!("{} featured pets", featured.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod command;
pub mod config;
pub mod envelope;
pub mod error;
pub mod list_state;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod prelude;
pub mod query;
pub mod retry;
pub mod subscription;
pub mod transport;

pub use error::{AppError, ErrorCode};
