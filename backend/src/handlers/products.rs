//! HTTP handlers for product and stock endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared::{Pagination, Product, ProductDetailsInput, ProductInput, StockAdjustmentInput};

use crate::error::AppResult;
use crate::services::{ProductService, RequestContext};
use crate::AppState;

/// Create a product, or restock and redescribe an existing one
pub async fn save_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.ledger);
    let product = service.save_product(&ctx, input).await?;
    Ok(Json(product))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.ledger);
    let products = service.list_products(&page).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.ledger);
    let product = service.get_product(&product_id).await?;
    Ok(Json(product))
}

/// Edit name, description, price, supplier or image
pub async fn update_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<String>,
    Json(input): Json<ProductDetailsInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.ledger);
    let product = service.update_product(&ctx, &product_id, input).await?;
    Ok(Json(product))
}

/// Apply a signed stock correction
pub async fn adjust_stock(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<String>,
    Json(input): Json<StockAdjustmentInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.ledger);
    let product = service.adjust_stock(&ctx, &product_id, input).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<String>,
) -> AppResult<StatusCode> {
    let service = ProductService::new(state.ledger);
    service.delete_product(&ctx, &product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
