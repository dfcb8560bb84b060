//! Sniffer server library
//!
//! Wires the shared scoring core to HTTP: provider clients with local
//! fallbacks, scan and feedback storage, and the dashboard.

use std::sync::{Arc, Mutex};

use axum::{routing::get, Router};
use rand::{rngs::StdRng, SeedableRng};
use sniffer_shared::scoring::ScoringEngine;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::Providers;
use store::{FeedbackStore, MemoryStore, ScanStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub scans: Arc<dyn ScanStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub config: Arc<Config>,
    pub engine: Arc<ScoringEngine>,
    pub providers: Arc<Providers>,
    /// Source of every random draw; seeded from config when reproducibility matters
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, config: Config, providers: Providers) -> Self
    where
        S: ScanStore + FeedbackStore + 'static,
    {
        let rng = match config.scoring.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            scans: store.clone(),
            feedback: store,
            config: Arc::new(config),
            engine: Arc::new(ScoringEngine::default()),
            providers: Arc::new(providers),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// In-memory store and no external providers
    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config, Providers::disabled())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Sniffer API v1"
}
