//! # linkfeed
//!
//! GraphQL service for shared links.
//!
//! ## Features
//!
//! - **Feed** - filtered, multi-key sorted, skip/take paginated links with a total count
//! - **Link CRUD** - `linkOne`, `post`, `update` and `delete`
//! - **Pluggable stores** - in-memory and PostgreSQL backends behind [`LinkStore`]
//! - **DataLoader** - batched user and voter loading for `postedBy` and `voters`
//! - **Auth context** - actor extraction from the `x-user-id` header
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use linkfeed::{build_schema, LinkStore, MemoryLinkStore};
//!
//! let store: Arc<dyn LinkStore> = Arc::new(MemoryLinkStore::new());
//! let schema = build_schema(store, 100);
//! ```

pub mod auth;
pub mod config;
pub mod dataloaders;
pub mod extensions;
pub mod feed;
pub mod links;
pub mod model;
pub mod pagination;
pub mod schema;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;

pub use auth::{extract_actor, get_actor, graphql_handler};
pub use config::Config;
pub use dataloaders::{UserLoader, VoterLoader};
pub use feed::{Feed, FeedArgs, FeedResolver};
pub use links::LinkService;
pub use model::{ActorId, Link, LinkChanges, NewLink, User};
pub use pagination::{FeedId, FeedWindow, DEFAULT_MAX_TAKE};
pub use schema::{build_schema, LinkSchema};
pub use store::{LinkFilter, LinkQuery, LinkStore, MemoryLinkStore, PgLinkStore, SortKey};
pub use types::{DateTime, LinkOrderByInput, Sort, SortField};

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Link service errors
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Link with ID {id} does not exist")]
    NotFound { id: i32 },

    #[error("Cannot post without logging in")]
    Unauthenticated,

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The store could not answer. The source stays server-side; clients
    /// only see the generic message.
    #[error("Store operation failed")]
    StoreFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LinkError {
    /// Create an invalid argument error
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure of the backing store
    pub fn store(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::StoreFailure(source.into())
    }

    /// Machine-readable code reported in `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::NotFound { .. } => "NOT_FOUND",
            LinkError::Unauthenticated => "UNAUTHENTICATED",
            LinkError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            LinkError::StoreFailure(_) => "STORE_FAILURE",
        }
    }

    /// Whether the failure came from the store rather than the caller
    pub fn is_store_failure(&self) -> bool {
        matches!(self, LinkError::StoreFailure(_))
    }
}

impl From<sqlx::Error> for LinkError {
    fn from(err: sqlx::Error) -> Self {
        Self::store(err)
    }
}

impl ErrorExtensions for LinkError {
    fn extend(&self) -> async_graphql::Error {
        match self {
            LinkError::StoreFailure(source) => {
                tracing::error!(error = %source, "store operation failed");
            }
            _ => tracing::debug!(error = %self, code = self.code(), "request rejected"),
        }

        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

/// Result type for link operations
pub type Result<T> = std::result::Result<T, LinkError>;
