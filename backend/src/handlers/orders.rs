//! HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{CreateOrderInput, Order, OrderWithLines, Pagination, Shipment, UpdateOrderInput};

use crate::error::AppResult;
use crate::services::{OrderService, RequestContext, ShipmentService};
use crate::AppState;

pub async fn create_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderWithLines>)> {
    let service = OrderService::new(state.ledger);
    let order = service.create_order(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Order>>> {
    let service = OrderService::new(state.ledger);
    let orders = service.list_orders(&page).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithLines>> {
    let service = OrderService::new(state.ledger);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Update an order; a `lines` array replaces every existing line
pub async fn update_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderWithLines>> {
    let service = OrderService::new(state.ledger);
    let order = service.update_order(&ctx, order_id, input).await?;
    Ok(Json(order))
}

/// Delete an order together with its shipments
pub async fn delete_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = OrderService::new(state.ledger);
    service.delete_order(&ctx, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_order_shipments(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<Shipment>>> {
    let service = ShipmentService::new(state.ledger);
    let shipments = service.list_for_order(order_id).await?;
    Ok(Json(shipments))
}
