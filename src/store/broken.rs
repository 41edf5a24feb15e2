//! Store whose every call fails, standing in for a lost connection

use std::collections::HashMap;

use async_trait::async_trait;

use super::{LinkFilter, LinkQuery, LinkStore};
use crate::model::{ActorId, Link, LinkChanges, NewLink, User};
use crate::{LinkError, Result};

pub(crate) struct BrokenStore;

fn timed_out() -> LinkError {
    LinkError::from(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl LinkStore for BrokenStore {
    async fn find(&self, _query: &LinkQuery) -> Result<Vec<Link>> {
        Err(timed_out())
    }

    async fn count(&self, _filter: &LinkFilter) -> Result<u64> {
        Err(timed_out())
    }

    async fn find_with_count(&self, _query: &LinkQuery) -> Result<(Vec<Link>, u64)> {
        Err(timed_out())
    }

    async fn find_by_id(&self, _id: i32) -> Result<Option<Link>> {
        Err(timed_out())
    }

    async fn create(&self, _link: NewLink, _actor: ActorId) -> Result<Link> {
        Err(timed_out())
    }

    async fn update(&self, _id: i32, _changes: LinkChanges) -> Result<Option<Link>> {
        Err(timed_out())
    }

    async fn delete(&self, _id: i32) -> Result<Option<Link>> {
        Err(LinkError::from(sqlx::Error::PoolClosed))
    }

    async fn users_by_ids(&self, _ids: &[i32]) -> Result<HashMap<i32, User>> {
        Err(timed_out())
    }

    async fn voter_ids_by_links(&self, _link_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>> {
        Err(timed_out())
    }
}
