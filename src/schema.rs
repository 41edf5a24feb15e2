//! GraphQL schema: `feed`, `linkOne`, `post`, `update` and `delete`

use std::sync::Arc;

use async_graphql::dataloader::DataLoader;
use async_graphql::{
    ComplexObject, Context, EmptySubscription, ErrorExtensions, Object, Result, Schema,
};

use crate::auth::get_actor;
use crate::dataloaders::{loaders, UserLoader, VoterLoader};
use crate::extensions::ArgumentErrorCodes;
use crate::feed::{Feed, FeedArgs, FeedResolver};
use crate::links::LinkService;
use crate::model::{Link, User};
use crate::store::LinkStore;
use crate::types::{DateTime, LinkOrderByInput};

pub type LinkSchema = Schema<Query, Mutation, EmptySubscription>;

/// Build the schema over `store`, capping feed pages at `max_take`
pub fn build_schema(store: Arc<dyn LinkStore>, max_take: u32) -> LinkSchema {
    let (users, voters) = loaders(store.clone());

    Schema::build(Query, Mutation, EmptySubscription)
        .extension(ArgumentErrorCodes)
        .data(FeedResolver::new(store.clone(), max_take))
        .data(LinkService::new(store))
        .data(users)
        .data(voters)
        .finish()
}

#[ComplexObject]
impl Link {
    #[graphql(name = "createdAt")]
    async fn created_at_scalar(&self) -> DateTime {
        DateTime(self.created_at)
    }

    async fn posted_by(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(user_id) = self.posted_by_id else {
            return Ok(None);
        };
        ctx.data::<DataLoader<UserLoader>>()?
            .load_one(user_id)
            .await
            .map_err(|e| e.extend())
    }

    async fn voters(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let ids = ctx
            .data::<DataLoader<VoterLoader>>()?
            .load_one(self.id)
            .await
            .map_err(|e| e.extend())?
            .unwrap_or_default();
        let mut users = ctx
            .data::<DataLoader<UserLoader>>()?
            .load_many(ids.iter().copied())
            .await
            .map_err(|e| e.extend())?;
        Ok(ids.iter().filter_map(|id| users.remove(id)).collect())
    }
}

#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    /// Links matching `filter`, ordered by `orderBy`, windowed by `skip`/`take`
    async fn feed(
        &self,
        ctx: &Context<'_>,
        filter: Option<String>,
        skip: Option<i32>,
        take: Option<i32>,
        order_by: Option<Vec<LinkOrderByInput>>,
    ) -> Result<Feed> {
        let args = FeedArgs {
            filter,
            skip,
            take,
            order_by,
        };
        ctx.data::<FeedResolver>()?
            .resolve(args)
            .await
            .map_err(|e| e.extend())
    }

    async fn link_one(&self, ctx: &Context<'_>, id: i32) -> Result<Option<Link>> {
        let link = ctx
            .data::<LinkService>()?
            .get_link(id)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(link))
    }
}

#[derive(Default)]
pub struct Mutation;

#[Object]
impl Mutation {
    /// Post a link as the current actor
    async fn post(&self, ctx: &Context<'_>, description: String, url: String) -> Result<Link> {
        ctx.data::<LinkService>()?
            .create_link(&description, &url, get_actor(ctx))
            .await
            .map_err(|e| e.extend())
    }

    async fn update(
        &self,
        ctx: &Context<'_>,
        id: i32,
        description: String,
        url: String,
    ) -> Result<Link> {
        ctx.data::<LinkService>()?
            .update_link(id, &description, &url)
            .await
            .map_err(|e| e.extend())
    }

    async fn delete(&self, ctx: &Context<'_>, id: i32) -> Result<Link> {
        ctx.data::<LinkService>()?
            .delete_link(id)
            .await
            .map_err(|e| e.extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::prepare_request;
    use crate::model::{ActorId, NewLink};
    use crate::store::broken::BrokenStore;
    use crate::store::counting::CountingStore;
    use crate::store::MemoryLinkStore;
    use async_graphql::Request;
    use serde_json::{json, Value};

    struct Harness {
        schema: LinkSchema,
        store: Arc<MemoryLinkStore>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(MemoryLinkStore::with_users([
                User {
                    id: 1,
                    name: "Alice".to_string(),
                    email: "alice@example.com".to_string(),
                },
                User {
                    id: 2,
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                },
            ]));
            let schema = build_schema(store.clone(), 100);
            Self { schema, store }
        }

        async fn seed(&self, description: &str, url: &str) -> Link {
            self.store
                .create(NewLink::new(description, url).unwrap(), ActorId(1))
                .await
                .unwrap()
        }

        async fn run(&self, query: &str, actor: Option<ActorId>) -> Value {
            let request = prepare_request(Request::new(query), actor);
            serde_json::to_value(self.schema.execute(request).await).unwrap()
        }
    }

    fn error_code(response: &Value) -> &str {
        response["errors"][0]["extensions"]["code"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_feed_filter_and_count() {
        let h = Harness::new();
        h.seed("GraphQL", "graphql.org").await;
        h.seed("Example", "example.com").await;

        let res = h
            .run(r#"{ feed(filter: "graphql") { count links { id url } } }"#, None)
            .await;

        assert_eq!(
            res["data"]["feed"],
            json!({ "count": 1, "links": [{ "id": 1, "url": "graphql.org" }] })
        );
    }

    #[tokio::test]
    async fn test_feed_order_and_window() {
        let h = Harness::new();
        h.seed("b", "b.com").await;
        h.seed("c", "c.com").await;
        h.seed("a", "a.com").await;

        let res = h
            .run(
                r#"{ feed(skip: 1, take: 1, orderBy: [{ description: desc }]) { count links { description } } }"#,
                None,
            )
            .await;

        assert_eq!(
            res["data"]["feed"],
            json!({ "count": 3, "links": [{ "description": "b" }] })
        );
    }

    #[tokio::test]
    async fn test_feed_id_differs_by_order() {
        let h = Harness::new();

        let by_url = h.run(r#"{ feed(orderBy: [{ url: asc }]) { id } }"#, None).await;
        let by_date = h.run(r#"{ feed(orderBy: [{ createdAt: asc }]) { id } }"#, None).await;
        let again = h.run(r#"{ feed(orderBy: [{ url: asc }]) { id } }"#, None).await;

        assert_ne!(by_url["data"]["feed"]["id"], by_date["data"]["feed"]["id"]);
        assert_eq!(by_url["data"]["feed"]["id"], again["data"]["feed"]["id"]);
    }

    #[tokio::test]
    async fn test_feed_take_above_limit() {
        let h = Harness::new();
        let res = h.run("{ feed(take: 500) { count } }", None).await;
        assert_eq!(error_code(&res), "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_post_requires_actor() {
        let h = Harness::new();
        let mutation = r#"mutation { post(description: "d", url: "u") { id } }"#;

        let res = h.run(mutation, None).await;
        assert_eq!(error_code(&res), "UNAUTHENTICATED");

        let res = h.run(mutation, Some(ActorId(99))).await;
        assert_eq!(error_code(&res), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_post_returns_generated_fields() {
        let h = Harness::new();
        let res = h
            .run(
                r#"mutation { post(description: "Prisma", url: "prisma.io") { id createdAt postedBy { name } voters { id } } }"#,
                Some(ActorId(2)),
            )
            .await;

        let post = &res["data"]["post"];
        assert_eq!(post["id"], 1);
        assert_eq!(post["postedBy"]["name"], "Bob");
        assert_eq!(post["voters"], json!([]));
        assert!(post["createdAt"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_link_is_not_found() {
        let h = Harness::new();
        let res = h
            .run(r#"mutation { update(id: 999, description: "d", url: "u") { id } }"#, None)
            .await;

        assert_eq!(error_code(&res), "NOT_FOUND");
        assert!(res["errors"][0]["message"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let h = Harness::new();
        h.seed("old", "old.com").await;

        let res = h
            .run(r#"mutation { update(id: 1, description: "new", url: "new.com") { id description url } }"#, None)
            .await;
        assert_eq!(
            res["data"]["update"],
            json!({ "id": 1, "description": "new", "url": "new.com" })
        );

        let res = h.run("mutation { delete(id: 1) { description } }", None).await;
        assert_eq!(res["data"]["delete"]["description"], "new");

        let res = h.run("{ linkOne(id: 1) { id } }", None).await;
        assert_eq!(error_code(&res), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_voters_resolve_in_id_order() {
        let h = Harness::new();
        let link = h.seed("GraphQL", "graphql.org").await;
        h.store.record_vote(link.id, 2).await.unwrap();
        h.store.record_vote(link.id, 1).await.unwrap();

        let res = h
            .run("{ linkOne(id: 1) { postedBy { id } voters { name } } }", None)
            .await;

        assert_eq!(
            res["data"]["linkOne"],
            json!({ "postedBy": { "id": 1 }, "voters": [{ "name": "Alice" }, { "name": "Bob" }] })
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_not_not_found() {
        let schema = build_schema(Arc::new(BrokenStore), 100);

        let request = prepare_request(Request::new("{ linkOne(id: 1) { id } }"), None);
        let res = serde_json::to_value(schema.execute(request).await).unwrap();

        assert_eq!(error_code(&res), "STORE_FAILURE");
        assert_eq!(res["errors"][0]["message"], "Store operation failed");
    }

    #[tokio::test]
    async fn test_feed_relations_load_in_batches() {
        let users = (1..=20).map(|id| User {
            id,
            name: format!("user-{}", id),
            email: format!("user{}@example.com", id),
        });
        let store = Arc::new(CountingStore::new(MemoryLinkStore::with_users(users)));
        for id in 1..=20 {
            let link = store
                .create(NewLink::new("link", "link.dev").unwrap(), ActorId(id))
                .await
                .unwrap();
            store.inner().record_vote(link.id, 21 - id).await.unwrap();
        }
        let schema = build_schema(store.clone(), 100);

        let res = serde_json::to_value(
            schema
                .execute("{ feed { links { postedBy { id } voters { id } } } }")
                .await,
        )
        .unwrap();

        let links = res["data"]["feed"]["links"].as_array().unwrap();
        assert_eq!(links.len(), 20);
        assert_eq!(links[0], json!({ "postedBy": { "id": 1 }, "voters": [{ "id": 20 }] }));
        assert_eq!(links[19], json!({ "postedBy": { "id": 20 }, "voters": [{ "id": 1 }] }));
        assert_eq!(store.voter_batches(), 1);
        // postedBy ids in one batch, voters' users in at most one more
        assert!(store.user_batches() <= 2, "{} user batches", store.user_batches());
    }

    #[tokio::test]
    async fn test_unknown_order_field_is_invalid_argument() {
        let h = Harness::new();
        let res = h.run("{ feed(orderBy: [{ votes: asc }]) { count } }", None).await;
        assert_eq!(error_code(&res), "INVALID_ARGUMENT");

        let res = h.run("{ feed(orderBy: [{ url: sideways }]) { count } }", None).await;
        assert_eq!(error_code(&res), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_sdl_field_names() {
        let sdl = Harness::new().schema.sdl();

        assert!(sdl.contains("orderBy: [LinkOrderByInput!]"));
        assert!(sdl.contains("createdAt: DateTime!"));
        assert!(sdl.contains("postedBy: User"));
        assert!(sdl.contains("voters: [User!]!"));
        assert!(sdl.contains("enum Sort"));
        assert!(sdl.contains("asc"));
    }
}
