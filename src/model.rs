//! Link and User records

use std::fmt;

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{LinkError, Result};

/// Authenticated identity performing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub i32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shared URL
///
/// `postedBy` and `voters` are resolved lazily by the schema, see
/// [`crate::schema`].
#[derive(SimpleObject, FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(complex)]
pub struct Link {
    pub id: i32,
    pub description: String,
    pub url: String,
    #[graphql(skip)]
    pub created_at: DateTime<Utc>,
    #[graphql(skip)]
    pub posted_by_id: Option<i32>,
}

/// A user that can post and vote on links
#[derive(SimpleObject, FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Fields supplied when posting a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub description: String,
    pub url: String,
}

/// Replacement values for an existing link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChanges {
    pub description: String,
    pub url: String,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LinkError::invalid_argument(field, "must not be empty"));
    }
    Ok(())
}

impl NewLink {
    pub fn new(description: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let link = Self {
            description: description.into(),
            url: url.into(),
        };
        require_text("description", &link.description)?;
        require_text("url", &link.url)?;
        Ok(link)
    }
}

impl LinkChanges {
    pub fn new(description: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let changes = Self {
            description: description.into(),
            url: url.into(),
        };
        require_text("description", &changes.description)?;
        require_text("url", &changes.url)?;
        Ok(changes)
    }
}
