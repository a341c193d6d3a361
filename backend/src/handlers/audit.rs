//! HTTP handler for reading the audit trail

use axum::{
    extract::{Query, State},
    Json,
};

use shared::{AuditEntry, AuditQuery};

use crate::error::AppResult;
use crate::services::AuditRecorder;
use crate::AppState;

/// Filter by table, record, action, employee and time range; newest first
pub async fn list_audit_entries(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let recorder = AuditRecorder::new(state.ledger);
    let entries = recorder.list(&query).await?;
    Ok(Json(entries))
}
