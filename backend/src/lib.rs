//! Store Operations backend
//!
//! Order and inventory consistency engine for a small retail business:
//! orders with derived totals, supply intakes that raise stock, spreadsheet
//! imports, shipments, and an audit trail of every ledger change.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use ledger::{LedgerStore, LedgerTx, MemoryLedger, PgLedger};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub ledger: PgLedger,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        Self {
            ledger: PgLedger::new(db.clone()),
            db,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Store Operations API v1"
}
