//! Store wrapper that counts the relation batches it serves

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{LinkFilter, LinkQuery, LinkStore, MemoryLinkStore};
use crate::model::{ActorId, Link, LinkChanges, NewLink, User};
use crate::Result;

pub(crate) struct CountingStore {
    inner: MemoryLinkStore,
    user_batches: AtomicUsize,
    voter_batches: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new(inner: MemoryLinkStore) -> Self {
        Self {
            inner,
            user_batches: AtomicUsize::new(0),
            voter_batches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn inner(&self) -> &MemoryLinkStore {
        &self.inner
    }

    pub(crate) fn user_batches(&self) -> usize {
        self.user_batches.load(Ordering::SeqCst)
    }

    pub(crate) fn voter_batches(&self) -> usize {
        self.voter_batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkStore for CountingStore {
    async fn find(&self, query: &LinkQuery) -> Result<Vec<Link>> {
        self.inner.find(query).await
    }

    async fn count(&self, filter: &LinkFilter) -> Result<u64> {
        self.inner.count(filter).await
    }

    async fn find_with_count(&self, query: &LinkQuery) -> Result<(Vec<Link>, u64)> {
        self.inner.find_with_count(query).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Link>> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, link: NewLink, actor: ActorId) -> Result<Link> {
        self.inner.create(link, actor).await
    }

    async fn update(&self, id: i32, changes: LinkChanges) -> Result<Option<Link>> {
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: i32) -> Result<Option<Link>> {
        self.inner.delete(id).await
    }

    async fn users_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, User>> {
        self.user_batches.fetch_add(1, Ordering::SeqCst);
        self.inner.users_by_ids(ids).await
    }

    async fn voter_ids_by_links(&self, link_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>> {
        self.voter_batches.fetch_add(1, Ordering::SeqCst);
        self.inner.voter_ids_by_links(link_ids).await
    }
}
