//! Write operations that invalidate cached queries on success.
//!
//! Mutations are one-off operations rather than subscriptions: each call runs
//! the request once through the retry policy (in [`RetryMode::Mutation`], so
//! 5xx responses are never replayed), normalizes the envelope, and on success
//! invalidates the declared tags. A failed mutation leaves the cache exactly
//! as it was.
//!
//! # Example
//!
//! ```rust,ignore
//! use pawhub_sync::prelude::*;
//!
//! enum Message {
//!     Submit(InterestFormData),
//!     Submitted(Result<SubmittedInterest, AppError>),
//! }
//!
//! fn update(&mut self, msg: Message) -> Command<Message> {
//!     match msg {
//!         Message::Submit(form) => match interests::submit(&form) {
//!             Ok(endpoint) => self.api.mutation_command(endpoint, Message::Submitted),
//!             Err(e) => Command::message(Message::Submitted(Err(e))),
//!         },
//!         Message::Submitted(Ok(_)) => Command::none(),
//!         Message::Submitted(Err(e)) => {
//!             self.error = Some(e.message);
//!             Command::none()
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::command::Command;
use crate::envelope::normalize;
use crate::error::AppError;
use crate::query::{QueryClient, Tag};
use crate::retry::{RetryMode, RetryPolicy};
use crate::transport::{Request, Transport};

/// The state of a mutation result.
#[derive(Debug, Clone)]
pub enum MutationState<T> {
    /// Mutation is idle (not yet started).
    Idle,
    /// Mutation is in progress.
    Loading,
    /// Mutation succeeded with a result.
    Success(T),
    /// Mutation failed with an error.
    Error(AppError),
}

/// A mutation result containing the current state.
#[derive(Debug, Clone)]
pub struct MutationResult<T> {
    /// The current state of the mutation.
    pub state: MutationState<T>,
}

impl<T> MutationResult<T> {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            state: MutationState::Idle,
        }
    }

    #[must_use]
    pub const fn loading() -> Self {
        Self {
            state: MutationState::Loading,
        }
    }

    /// Returns the result data if the mutation succeeded, otherwise `None`.
    pub const fn data(&self) -> Option<&T> {
        match &self.state {
            MutationState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the error if the mutation failed, otherwise `None`.
    pub const fn error(&self) -> Option<&AppError> {
        match &self.state {
            MutationState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if the mutation is currently loading.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, MutationState::Loading)
    }

    /// Returns `true` if the mutation succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self.state, MutationState::Success(_))
    }

    /// Returns `true` if the mutation failed.
    pub const fn is_error(&self) -> bool {
        matches!(self.state, MutationState::Error(_))
    }
}

impl<T> From<Result<T, AppError>> for MutationResult<T> {
    fn from(result: Result<T, AppError>) -> Self {
        let state = match result {
            Ok(data) => MutationState::Success(data),
            Err(e) => MutationState::Error(e),
        };
        Self { state }
    }
}

/// Runs write requests and invalidates cache tags when they succeed.
#[derive(Clone)]
pub struct MutationExecutor {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    client: QueryClient,
    log_errors: bool,
}

impl MutationExecutor {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy, client: QueryClient) -> Self {
        Self {
            transport,
            retry,
            client,
            log_errors: false,
        }
    }

    /// Logs every failed mutation at `error` level.
    #[must_use]
    pub const fn with_error_logging(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }

    /// Executes `request` and, if it succeeds, invalidates `invalidates`.
    ///
    /// Only network and timeout failures are retried.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`AppError`]. No tags are invalidated in that case.
    pub async fn mutate<T>(&self, request: Request, invalidates: &[Tag]) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let transport = self.transport.clone();
        let outcome = self
            .retry
            .execute(RetryMode::Mutation, || transport.send(&request))
            .await;

        match normalize::<T>(outcome) {
            Ok(value) => {
                tracing::debug!(request = %request, tags = invalidates.len(), "mutation succeeded");
                if !invalidates.is_empty() {
                    self.client.invalidate(invalidates);
                }
                Ok(value)
            }
            Err(error) => {
                if self.log_errors {
                    tracing::error!(request = %request, code = %error.code, message = %error.message, "mutation failed");
                } else {
                    tracing::debug!(request = %request, code = %error.code, "mutation failed");
                }
                Err(error)
            }
        }
    }

    /// Wraps [`mutate`](Self::mutate) in a [`Command`] producing one message.
    pub fn command<T, Msg>(
        &self,
        request: Request,
        invalidates: Vec<Tag>,
        f: impl FnOnce(Result<T, AppError>) -> Msg + Send + 'static,
    ) -> Command<Msg>
    where
        T: DeserializeOwned + Send + 'static,
        Msg: Send + 'static,
    {
        let executor = self.clone();
        Command::perform(
            async move { executor.mutate::<T>(request, &invalidates).await },
            f,
        )
    }

    #[must_use]
    pub const fn client(&self) -> &QueryClient {
        &self.client
    }
}
