mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskcal_core::{scheduler, JsonUserStore, SyncConfig, SyncContext};
use taskcal_provider_google::{GoogleCredentials, GoogleProvider};

use crate::state::AppState;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(SyncConfig::load()?);
    let store = Arc::new(JsonUserStore::open(&config.database_path));
    let provider = Arc::new(GoogleProvider::new(GoogleCredentials::load()?)?);

    let ctx = Arc::new(SyncContext::new(store, provider, config));

    // Periodic inbound sync runs independently of any request.
    tokio::spawn(scheduler::run(ctx.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::data::router())
        .merge(routes::sync::router())
        .merge(routes::auth::router())
        .with_state(AppState { ctx })
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));
    info!("taskcal-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
