//! Route definitions for the store operations API

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        // Everything below requires a bearer token
        .merge(protected_routes(state))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.config.import.max_upload_bytes;

    Router::new()
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/shipments", shipment_routes())
        .nest("/supply", supply_routes(upload_limit))
        .route("/audit", get(handlers::list_audit_entries))
        .route("/auth/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product catalogue and stock routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::save_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/stock", post(handlers::adjust_stock))
}

/// Order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:order_id/shipments", get(handlers::list_order_shipments))
}

/// Shipment routes
fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_shipment))
        .route(
            "/:shipment_id",
            get(handlers::get_shipment)
                .put(handlers::update_shipment)
                .delete(handlers::delete_shipment),
        )
}

/// Supply intake and bulk import routes
fn supply_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_intakes).post(handlers::create_intake))
        .route(
            "/import",
            post(handlers::import_supply).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/:intake_id",
            get(handlers::get_intake).delete(handlers::delete_intake),
        )
        .route(
            "/:intake_id/lines/:product_id",
            put(handlers::update_line).delete(handlers::delete_line),
        )
}
