//! Axum server: GraphQL endpoint, GraphiQL page and health check
//!
//! - `POST /graphql` executes a request, reading the actor from `x-user-id`
//! - `GET /graphql` serves GraphiQL
//! - `GET /health` answers `ok`

use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use axum::{
    response::Html,
    routing::get,
    Extension, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::auth::graphql_handler;
use crate::config::Config;
use crate::schema::build_schema;
use crate::store::LinkStore;

/// Build the application router over `store`
pub fn router(store: Arc<dyn LinkStore>, max_take: u32) -> Router {
    let schema = build_schema(store, max_take);

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/health", get(health))
        .layer(Extension(schema))
        .layer(TraceLayer::new_for_http())
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn health() -> &'static str {
    "ok"
}

/// Serve until Ctrl+C or SIGTERM
pub async fn run_server(config: &Config, store: Arc<dyn LinkStore>) -> std::io::Result<()> {
    let app = router(store, config.max_take);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("GraphQL server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
