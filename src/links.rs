//! Single-link operations: lookup, post, update and delete

use std::sync::Arc;

use crate::model::{ActorId, Link, LinkChanges, NewLink};
use crate::store::LinkStore;
use crate::{LinkError, Result};

/// Thin CRUD layer over a [`LinkStore`]
///
/// Missing rows become [`LinkError::NotFound`]; store errors are passed
/// through untouched so they are never reported as missing rows.
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn LinkStore>,
}

impl LinkService {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    pub async fn get_link(&self, id: i32) -> Result<Link> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(LinkError::NotFound { id })
    }

    /// Post a new link on behalf of `actor`
    #[tracing::instrument(skip(self, description, url))]
    pub async fn create_link(
        &self,
        description: &str,
        url: &str,
        actor: Option<ActorId>,
    ) -> Result<Link> {
        let actor = actor.ok_or(LinkError::Unauthenticated)?;
        let link = NewLink::new(description, url)?;

        let created = self.store.create(link, actor).await?;
        tracing::info!(link_id = created.id, "link posted");
        Ok(created)
    }

    #[tracing::instrument(skip(self, description, url))]
    pub async fn update_link(&self, id: i32, description: &str, url: &str) -> Result<Link> {
        let changes = LinkChanges::new(description, url)?;
        self.store
            .update(id, changes)
            .await?
            .ok_or(LinkError::NotFound { id })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_link(&self, id: i32) -> Result<Link> {
        let removed = self
            .store
            .delete(id)
            .await?
            .ok_or(LinkError::NotFound { id })?;
        tracing::info!(link_id = id, "link deleted");
        Ok(removed)
    }
}
