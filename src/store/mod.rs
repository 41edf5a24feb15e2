//! Link persistence
//!
//! [`LinkStore`] is the seam between the resolvers and the backing data
//! store. Resolvers only see the trait, so backends can be swapped without
//! touching them.

pub mod memory;
pub mod postgres;

#[cfg(test)]
pub(crate) mod broken;
#[cfg(test)]
pub(crate) mod counting;

pub use memory::MemoryLinkStore;
pub use postgres::PgLinkStore;

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{ActorId, Link, LinkChanges, NewLink, User};
use crate::types::{Sort, SortField};
use crate::Result;

/// Text filter over `description` and `url`
///
/// Matching is a case-insensitive substring test against either field. An
/// empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    needle: Option<String>,
}

impl LinkFilter {
    pub fn new(filter: Option<&str>) -> Self {
        Self {
            needle: filter.filter(|f| !f.is_empty()).map(str::to_owned),
        }
    }

    /// The substring to look for, if any
    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    pub fn matches(&self, link: &Link) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                link.description.to_lowercase().contains(&needle)
                    || link.url.to_lowercase().contains(&needle)
            }
        }
    }
}

/// One component of a composite sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Sort,
}

impl SortKey {
    pub fn new(field: SortField, direction: Sort) -> Self {
        Self { field, direction }
    }
}

/// Compare two links by a composite sort, falling back to ascending `id`
///
/// The `id` tiebreaker makes the ordering total, which keeps skip/take
/// windows consistent across calls.
pub fn compare_links(order: &[SortKey], a: &Link, b: &Link) -> Ordering {
    order
        .iter()
        .map(|key| {
            let ord = match key.field {
                SortField::Description => a.description.cmp(&b.description),
                SortField::Url => a.url.cmp(&b.url),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            match key.direction {
                Sort::Asc => ord,
                Sort::Desc => ord.reverse(),
            }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

/// A filtered, sorted, windowed read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkQuery {
    pub filter: LinkFilter,
    pub order: Vec<SortKey>,
    pub skip: u64,
    /// `None` means no limit
    pub take: Option<u64>,
}

/// Backing store for links and the users they reference
///
/// Lookups by id return `Ok(None)` when the row does not exist; `Err` is
/// reserved for failures of the store itself.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Links matching `query.filter`, sorted by `query.order` then `id`, windowed
    async fn find(&self, query: &LinkQuery) -> Result<Vec<Link>>;

    /// Number of links matching `filter`, ignoring any window
    async fn count(&self, filter: &LinkFilter) -> Result<u64>;

    /// [`LinkStore::find`] and [`LinkStore::count`] read from one snapshot
    ///
    /// The count is always the size of the unwindowed result the page was
    /// cut from, even under concurrent writes.
    async fn find_with_count(&self, query: &LinkQuery) -> Result<(Vec<Link>, u64)>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Link>>;

    /// Insert a link posted by `actor`
    ///
    /// Fails with [`crate::LinkError::Unauthenticated`] if `actor` is not a
    /// known user.
    async fn create(&self, link: NewLink, actor: ActorId) -> Result<Link>;

    async fn update(&self, id: i32, changes: LinkChanges) -> Result<Option<Link>>;

    /// Remove a link and its votes, returning the removed row
    async fn delete(&self, id: i32) -> Result<Option<Link>>;

    /// Users with the given ids; unknown ids are absent from the map
    async fn users_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, User>>;

    /// Voter ids per link, ascending; links without votes are absent
    async fn voter_ids_by_links(&self, link_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>>;
}
