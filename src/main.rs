use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use linkfeed::{server, telemetry, Config, LinkStore, MemoryLinkStore, PgLinkStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.log_filter).map_err(|err| anyhow!(err))?;

    let store: Arc<dyn LinkStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Using PostgreSQL link store");
            let store = PgLinkStore::connect(url, config.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!(
                users = config.users.len(),
                "DATABASE_URL not set, links are kept in memory only"
            );
            Arc::new(MemoryLinkStore::with_users(config.users.clone()))
        }
    };

    server::run_server(&config, store)
        .await
        .context("Server exited with an error")?;
    Ok(())
}
