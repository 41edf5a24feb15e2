//! Feed resolution: filter, composite ordering, skip/take and total count

use std::sync::Arc;

use async_graphql::{SimpleObject, ID};
use serde::{Deserialize, Serialize};

use crate::model::Link;
use crate::pagination::{FeedId, FeedWindow};
use crate::store::{LinkFilter, LinkQuery, LinkStore, SortKey};
use crate::types::LinkOrderByInput;
use crate::{LinkError, Result};

/// Arguments of a feed query, exactly as the caller supplied them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedArgs {
    pub filter: Option<String>,
    pub skip: Option<i32>,
    pub take: Option<i32>,
    pub order_by: Option<Vec<LinkOrderByInput>>,
}

impl FeedArgs {
    /// Deterministic identifier for this argument set
    pub fn id(&self) -> Result<String> {
        FeedId::encode(self)
    }

    /// Recover the arguments a feed id was derived from
    pub fn from_id(id: &str) -> Result<Self> {
        FeedId::decode(id)
    }

    fn sort_keys(&self) -> Result<Vec<SortKey>> {
        self.order_by
            .iter()
            .flatten()
            .map(|input| input.key().map(|(field, dir)| SortKey::new(field, dir)))
            .collect()
    }
}

/// One page of the link feed
#[derive(SimpleObject, Debug, Clone)]
pub struct Feed {
    pub links: Vec<Link>,
    /// Links matching the filter, regardless of skip/take
    pub count: i32,
    pub id: Option<ID>,
}

/// Resolves feed queries against a [`LinkStore`]
#[derive(Clone)]
pub struct FeedResolver {
    store: Arc<dyn LinkStore>,
    max_take: u32,
}

impl FeedResolver {
    pub fn new(store: Arc<dyn LinkStore>, max_take: u32) -> Self {
        Self { store, max_take }
    }

    /// Produce the page of links and total count for `args`
    ///
    /// Argument validation happens before the store is touched.
    #[tracing::instrument(skip(self), fields(count, returned))]
    pub async fn resolve(&self, args: FeedArgs) -> Result<Feed> {
        let window = FeedWindow::new(args.skip, args.take, self.max_take)?;
        let order = args.sort_keys()?;
        let id = args.id()?;

        let query = LinkQuery {
            filter: LinkFilter::new(args.filter.as_deref()),
            order,
            skip: window.skip,
            take: Some(window.take),
        };

        let (links, count) = self.store.find_with_count(&query).await?;
        let count = count_to_int(count)?;

        let span = tracing::Span::current();
        span.record("count", count);
        span.record("returned", links.len());

        Ok(Feed {
            links,
            count,
            id: Some(ID::from(id)),
        })
    }
}

/// `count` as a GraphQL `Int`
fn count_to_int(count: u64) -> Result<i32> {
    i32::try_from(count).map_err(|_| {
        LinkError::store(format!("feed count {} exceeds the GraphQL Int range", count))
    })
}
