//! GraphQL request context: actor extraction and per-request data
//!
//! Provides helpers for:
//! - Extracting the acting user id from HTTP headers
//! - Attaching the actor to a GraphQL request
//! - Standard Axum handler for the GraphQL endpoint

use async_graphql::{Context, Request, Response};
use axum::{extract::Extension, http::HeaderMap, Json};

use crate::model::ActorId;
use crate::schema::LinkSchema;

/// Header carrying the authenticated user id
pub const ACTOR_HEADER: &str = "x-user-id";

/// Extract the actor from the `x-user-id` header
///
/// A missing or unparsable header yields `None`.
pub fn extract_actor(headers: &HeaderMap) -> Option<ActorId> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i32>().ok())
        .map(ActorId)
}

/// Attach request-scoped data: the actor, if any
pub fn prepare_request(request: Request, actor: Option<ActorId>) -> Request {
    match actor {
        Some(actor) => request.data(actor),
        None => request,
    }
}

/// Standard GraphQL handler with actor injection
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use axum::{Extension, Router, routing::post};
/// use linkfeed::{build_schema, graphql_handler, LinkStore, MemoryLinkStore};
///
/// let store: Arc<dyn LinkStore> = Arc::new(MemoryLinkStore::new());
/// let app: Router = Router::new()
///     .route("/graphql", post(graphql_handler))
///     .layer(Extension(build_schema(store, 100)));
/// ```
pub async fn graphql_handler(
    Extension(schema): Extension<LinkSchema>,
    headers: HeaderMap,
    req: Json<Request>,
) -> Json<Response> {
    let actor = extract_actor(&headers);
    let request = prepare_request(req.0, actor);

    let response = schema.execute(request).await;

    Json(response)
}

/// Get the acting user from GraphQL context
pub fn get_actor(ctx: &Context<'_>) -> Option<ActorId> {
    ctx.data_opt::<ActorId>().copied()
}
