//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, AuthTokens, LoginInput};
use crate::AppState;

/// Exchange employee credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config.jwt);
    let tokens = service.login(&input).await?;
    Ok(Json(tokens))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub employee_id: Uuid,
    pub role: String,
}

/// The employee behind the bearer token
pub async fn me(current_user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        employee_id: current_user.0.employee_id,
        role: current_user.0.role,
    })
}
