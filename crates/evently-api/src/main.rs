//! Evently API Server

use anyhow::Context;
use evently_api::{create_router, init_tracing, state::AppState};
use evently_core::config::AppConfig;
use evently_core::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing TOKEN_SIGNING_SECRET stops startup here
    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(&config.logging);

    let store: Arc<dyn CredentialStore> = match config.database.postgres_url.as_deref() {
        Some(url) => {
            let store = PgCredentialStore::new(url, config.database.pool_size)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store.migrate().await.context("Failed to apply migrations")?;
            tracing::info!(
                pool_size = config.database.pool_size,
                "Using PostgreSQL credential store"
            );
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(&config.auth, store)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Evently API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
