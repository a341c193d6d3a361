//! HTTP handlers for supply intake endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    CreateSupplyIntakeInput, Pagination, SupplyIntake, SupplyIntakeWithLines, SupplyLine,
    UpdateSupplyLineInput,
};

use crate::error::AppResult;
use crate::services::{RequestContext, SupplyService};
use crate::AppState;

/// Record goods received from a supplier
pub async fn create_intake(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateSupplyIntakeInput>,
) -> AppResult<(StatusCode, Json<SupplyIntakeWithLines>)> {
    let service = SupplyService::new(state.ledger);
    let intake = service.create_intake(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(intake)))
}

pub async fn list_intakes(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<SupplyIntake>>> {
    let service = SupplyService::new(state.ledger);
    let intakes = service.list_intakes(&page).await?;
    Ok(Json(intakes))
}

pub async fn get_intake(
    State(state): State<AppState>,
    Path(intake_id): Path<Uuid>,
) -> AppResult<Json<SupplyIntakeWithLines>> {
    let service = SupplyService::new(state.ledger);
    let intake = service.get_intake(intake_id).await?;
    Ok(Json(intake))
}

/// Delete the intake record. Stock it brought in is kept.
pub async fn delete_intake(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(intake_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = SupplyService::new(state.ledger);
    service.delete_intake(&ctx, intake_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_line(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((intake_id, product_id)): Path<(Uuid, String)>,
    Json(input): Json<UpdateSupplyLineInput>,
) -> AppResult<Json<SupplyLine>> {
    let service = SupplyService::new(state.ledger);
    let line = service.update_line(&ctx, intake_id, &product_id, input).await?;
    Ok(Json(line))
}

pub async fn delete_line(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((intake_id, product_id)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    let service = SupplyService::new(state.ledger);
    service.delete_line(&ctx, intake_id, &product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
