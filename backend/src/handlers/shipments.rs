//! HTTP handlers for shipment endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{CreateShipmentInput, Shipment, UpdateShipmentInput};

use crate::error::AppResult;
use crate::services::{RequestContext, ShipmentService};
use crate::AppState;

pub async fn create_shipment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateShipmentInput>,
) -> AppResult<(StatusCode, Json<Shipment>)> {
    let service = ShipmentService::new(state.ledger);
    let shipment = service.create_shipment(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

pub async fn get_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<Json<Shipment>> {
    let service = ShipmentService::new(state.ledger);
    let shipment = service.get_shipment(shipment_id).await?;
    Ok(Json(shipment))
}

pub async fn update_shipment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<UpdateShipmentInput>,
) -> AppResult<Json<Shipment>> {
    let service = ShipmentService::new(state.ledger);
    let shipment = service.update_shipment(&ctx, shipment_id, input).await?;
    Ok(Json(shipment))
}

pub async fn delete_shipment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ShipmentService::new(state.ledger);
    service.delete_shipment(&ctx, shipment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
