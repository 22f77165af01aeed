use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use courtbook::config::AppConfig;
use courtbook::db;
use courtbook::handlers;
use courtbook::services::backend::local::LocalBackend;
use courtbook::services::backend::remote::RemoteBackend;
use courtbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let state = if config.backend_url.is_empty() {
        tracing::info!("using local reservations backend (db: {})", config.database_url);
        let conn = db::init_db(&config.database_url)?;
        let local = LocalBackend::new(Arc::new(Mutex::new(conn)));
        AppState::new(config.clone(), Box::new(local.clone()), Box::new(local))
    } else {
        tracing::info!("using remote reservations backend (url: {})", config.backend_url);
        let timeout = Duration::from_secs(config.backend_timeout_secs);
        let remote = RemoteBackend::new(&config.backend_url, timeout)?;
        AppState::new(config.clone(), Box::new(remote.clone()), Box::new(remote))
    };

    let app = handlers::router(Arc::new(state));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
