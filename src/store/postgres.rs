//! PostgreSQL link store

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{LinkFilter, LinkQuery, LinkStore, SortKey};
use crate::model::{ActorId, Link, LinkChanges, NewLink, User};
use crate::types::{Sort, SortField};
use crate::{LinkError, Result};

const LINK_COLUMNS: &str = "id, description, url, created_at, posted_by_id";

/// Link store backed by a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgLinkStore {
    pool: PgPool,
}

impl PgLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and run migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the `users`, `links` and `link_votes` tables if missing
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running link store migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id SERIAL PRIMARY KEY,
                description TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                posted_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS link_votes (
                link_id INTEGER NOT NULL REFERENCES links(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (link_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_created_at ON links(created_at)")
            .execute(&self.pool)
            .await?;

        tracing::info!("Link store migrations complete");
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so the filter is matched literally by ILIKE
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LinkFilter) {
    if let Some(needle) = filter.needle() {
        let pattern = like_pattern(needle);
        qb.push(" WHERE (description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR url ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Sort expression for `field`
///
/// Text columns compare with the "C" collation, i.e. by bytes, which is how
/// the in-memory store orders `String`s.
fn column(field: SortField) -> &'static str {
    match field {
        SortField::Description => r#"description COLLATE "C""#,
        SortField::Url => r#"url COLLATE "C""#,
        SortField::CreatedAt => "created_at",
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[SortKey]) {
    qb.push(" ORDER BY ");
    for key in order {
        qb.push(column(key.field));
        qb.push(match key.direction {
            Sort::Asc => " ASC, ",
            Sort::Desc => " DESC, ",
        });
    }
    qb.push("id ASC");
}

fn to_i64(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| LinkError::invalid_argument(field, "out of range"))
}

fn find_query(query: &LinkQuery) -> Result<QueryBuilder<'static, Postgres>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM links", LINK_COLUMNS));
    push_filter(&mut qb, &query.filter);
    push_order(&mut qb, &query.order);

    if let Some(take) = query.take {
        qb.push(" LIMIT ").push_bind(to_i64("take", take)?);
    }
    qb.push(" OFFSET ").push_bind(to_i64("skip", query.skip)?);
    Ok(qb)
}

fn count_query(filter: &LinkFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM links");
    push_filter(&mut qb, filter);
    qb
}

#[async_trait]
impl LinkStore for PgLinkStore {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn find(&self, query: &LinkQuery) -> Result<Vec<Link>> {
        let mut qb = find_query(query)?;
        let links = qb.build_query_as::<Link>().fetch_all(&self.pool).await?;
        Ok(links)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn count(&self, filter: &LinkFilter) -> Result<u64> {
        let total: i64 = count_query(filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn find_with_count(&self, query: &LinkQuery) -> Result<(Vec<Link>, u64)> {
        let mut find = find_query(query)?;
        let mut count = count_query(&query.filter);

        // Both statements see the snapshot taken by the first one.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        let links = find.build_query_as::<Link>().fetch_all(&mut *tx).await?;
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok((links, total.max(0) as u64))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {} FROM links WHERE id = $1",
            LINK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    async fn create(&self, link: NewLink, actor: ActorId) -> Result<Link> {
        // Inserts nothing when the actor is not a known user.
        let created = sqlx::query_as::<_, Link>(&format!(
            r#"
            INSERT INTO links (description, url, posted_by_id)
            SELECT $1, $2, u.id FROM users u WHERE u.id = $3
            RETURNING {}
            "#,
            LINK_COLUMNS
        ))
        .bind(&link.description)
        .bind(&link.url)
        .bind(actor.0)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or(LinkError::Unauthenticated)
    }

    async fn update(&self, id: i32, changes: LinkChanges) -> Result<Option<Link>> {
        let updated = sqlx::query_as::<_, Link>(&format!(
            "UPDATE links SET description = $1, url = $2 WHERE id = $3 RETURNING {}",
            LINK_COLUMNS
        ))
        .bind(&changes.description)
        .bind(&changes.url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<Option<Link>> {
        let removed = sqlx::query_as::<_, Link>(&format!(
            "DELETE FROM links WHERE id = $1 RETURNING {}",
            LINK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(removed)
    }

    async fn users_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, User>> {
        let users: Vec<User> =
            sqlx::query_as("SELECT id, name, email FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn voter_ids_by_links(&self, link_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>> {
        let rows: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT link_id, user_id FROM link_votes WHERE link_id = ANY($1) ORDER BY link_id, user_id",
        )
        .bind(link_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut voters: HashMap<i32, Vec<i32>> = HashMap::new();
        for (link_id, user_id) in rows {
            voters.entry(link_id).or_default().push(user_id);
        }
        Ok(voters)
    }
}
