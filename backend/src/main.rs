//! Sniffer server
//!
//! Scores foraging scans, learns per-zone weights from field feedback and
//! serves the analytics dashboard.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sniffer_backend::{
    create_app,
    external::Providers,
    store::{MemoryStore, PgStore},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sniffer_server=debug,sniffer_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Sniffer server");
    tracing::info!("Environment: {}", config.environment);

    let providers = Providers::from_config(&config.providers)?;
    tracing::info!("External providers enabled: {:?}", providers.enabled());

    let state = match config.database.url.clone() {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&url)
                .await?;
            tracing::info!("Database connection established");

            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            AppState::new(Arc::new(PgStore::new(db_pool)), config.clone(), providers)
        }
        None => {
            tracing::warn!("No database configured, records are kept in memory only");
            AppState::new(Arc::new(MemoryStore::new()), config.clone(), providers)
        }
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
