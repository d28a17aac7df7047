/// RBAC Service - Main entry point
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use rbac_service::{
    config::Config,
    db::{CredentialStore, PgCredentialStore},
    migrations, routes,
    security::TokenCodec,
    seed, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().context("Failed to load configuration from environment")?;

    tracing::info!(
        "Starting RBAC service on {}:{}",
        config.server_host,
        config.server_port
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Database connection pool initialized");

    migrations::run_all(&db_pool).await?;

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(db_pool));
    seed::ensure_default_roles(store.as_ref()).await?;

    let tokens = Arc::new(TokenCodec::from_config(&config));
    let state = AppState::new(store, tokens);

    let app = routes::app(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("REST API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
