//! In-process link store

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{compare_links, LinkFilter, LinkQuery, LinkStore};
use crate::model::{ActorId, Link, LinkChanges, NewLink, User};
use crate::{LinkError, Result};

#[derive(Debug, Default)]
struct Tables {
    links: BTreeMap<i32, Link>,
    users: BTreeMap<i32, User>,
    votes: HashMap<i32, BTreeSet<i32>>,
    next_link_id: i32,
}

impl Tables {
    fn select(&self, query: &LinkQuery) -> Vec<Link> {
        let mut matched: Vec<&Link> = self
            .links
            .values()
            .filter(|link| query.filter.matches(link))
            .collect();
        matched.sort_by(|a, b| compare_links(&query.order, a, b));

        let take = query.take.map_or(usize::MAX, |t| t as usize);
        matched
            .into_iter()
            .skip(query.skip as usize)
            .take(take)
            .cloned()
            .collect()
    }

    fn count(&self, filter: &LinkFilter) -> u64 {
        self.links.values().filter(|link| filter.matches(link)).count() as u64
    }
}

/// Link store held in memory
///
/// Ids are assigned from a counter and never reused after deletion.
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    tables: RwLock<Tables>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already knows the given users
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let tables = Tables {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            ..Default::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Record that `user_id` voted for `link_id`
    ///
    /// Voting is driven from outside this service; this exists for seeding.
    pub async fn record_vote(&self, link_id: i32, user_id: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.links.contains_key(&link_id) {
            return Err(LinkError::NotFound { id: link_id });
        }
        if !tables.users.contains_key(&user_id) {
            return Err(LinkError::invalid_argument(
                "userId",
                format!("unknown user {}", user_id),
            ));
        }
        tables.votes.entry(link_id).or_default().insert(user_id);
        Ok(())
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn find(&self, query: &LinkQuery) -> Result<Vec<Link>> {
        Ok(self.tables.read().await.select(query))
    }

    async fn count(&self, filter: &LinkFilter) -> Result<u64> {
        Ok(self.tables.read().await.count(filter))
    }

    async fn find_with_count(&self, query: &LinkQuery) -> Result<(Vec<Link>, u64)> {
        let tables = self.tables.read().await;
        Ok((tables.select(query), tables.count(&query.filter)))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Link>> {
        Ok(self.tables.read().await.links.get(&id).cloned())
    }

    async fn create(&self, link: NewLink, actor: ActorId) -> Result<Link> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&actor.0) {
            return Err(LinkError::Unauthenticated);
        }

        tables.next_link_id += 1;
        let created = Link {
            id: tables.next_link_id,
            description: link.description,
            url: link.url,
            created_at: Utc::now(),
            posted_by_id: Some(actor.0),
        };
        tables.links.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: LinkChanges) -> Result<Option<Link>> {
        let mut tables = self.tables.write().await;
        Ok(tables.links.get_mut(&id).map(|link| {
            link.description = changes.description;
            link.url = changes.url;
            link.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<Option<Link>> {
        let mut tables = self.tables.write().await;
        let removed = tables.links.remove(&id);
        if removed.is_some() {
            tables.votes.remove(&id);
        }
        Ok(removed)
    }

    async fn users_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, User>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|u| (*id, u.clone())))
            .collect())
    }

    async fn voter_ids_by_links(&self, link_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>> {
        let tables = self.tables.read().await;
        Ok(link_ids
            .iter()
            .filter_map(|id| {
                tables
                    .votes
                    .get(id)
                    .filter(|voters| !voters.is_empty())
                    .map(|voters| (*id, voters.iter().copied().collect()))
            })
            .collect())
    }
}
