//! Batch loaders for the `Link` relation fields
//!
//! Resolving `postedBy`/`voters` link by link would cost one store call per
//! link. These loaders plug into `async_graphql::dataloader::DataLoader`,
//! which collects the keys requested while a list of links resolves and
//! hands them to the store in one call.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::{DataLoader, Loader};

use crate::model::User;
use crate::store::LinkStore;
use crate::LinkError;

/// Loads users by id
pub struct UserLoader {
    store: Arc<dyn LinkStore>,
}

impl UserLoader {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }
}

impl Loader<i32> for UserLoader {
    type Value = User;
    // Loader errors are cloned to every waiting key.
    type Error = Arc<LinkError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, User>, Self::Error> {
        tracing::trace!(count = keys.len(), "loading users");
        self.store.users_by_ids(keys).await.map_err(Arc::new)
    }
}

/// Loads the ascending voter ids of links, keyed by link id
///
/// Links nobody voted for are absent from the batch result.
pub struct VoterLoader {
    store: Arc<dyn LinkStore>,
}

impl VoterLoader {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }
}

impl Loader<i32> for VoterLoader {
    type Value = Vec<i32>;
    type Error = Arc<LinkError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Vec<i32>>, Self::Error> {
        tracing::trace!(count = keys.len(), "loading voters");
        self.store.voter_ids_by_links(keys).await.map_err(Arc::new)
    }
}

/// Batching loaders over `store`, spawned on the tokio runtime
pub fn loaders(
    store: Arc<dyn LinkStore>,
) -> (DataLoader<UserLoader>, DataLoader<VoterLoader>) {
    (
        DataLoader::new(UserLoader::new(store.clone()), tokio::spawn),
        DataLoader::new(VoterLoader::new(store), tokio::spawn),
    )
}
