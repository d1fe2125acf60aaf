//! Prelude module for convenient imports.
//!
//! ```
//! use pawhub_sync::prelude::*;
//! ```
//!
//! # What's included
//!
//! - [`ApiClient`] and the endpoint modules [`pets`], [`interests`],
//!   [`breeders`], [`categories`], [`health`] and [`admin`]
//! - [`Command`] and [`Subscription`] - For message-driven front ends
//! - [`QueryClient`], [`QueryResult`] and [`Tag`] - The query cache
//! - [`MutationResult`] - Mutation lifecycle state
//! - [`ListStateSync`] and friends - URL-backed listing state
//! - The resource models

pub use crate::api::{
    ApiClient, MutationEndpoint, QueryEndpoint, admin, breeders, categories, health, interests,
    pets,
};
pub use crate::command::Command;
pub use crate::config::ApiConfig;
pub use crate::envelope::{PageMeta, Paginated};
pub use crate::error::{AppError, ErrorCode};
pub use crate::list_state::{
    ListStateSync, Location, MemoryNavigator, Navigator, PetSort, ViewState, ViewStateUpdate,
};
pub use crate::models::*;
pub use crate::mutation::{MutationResult, MutationState};
pub use crate::query::{QueryClient, QueryKey, QueryResult, QueryState, Tag};
pub use crate::subscription::{Subscription, SubscriptionSource};
