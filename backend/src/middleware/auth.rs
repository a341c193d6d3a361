//! Authentication middleware
//!
//! Validates the bearer token and makes the employee available to handlers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::TokenIssuer;
use crate::AppState;

/// Authenticated employee extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub employee_id: Uuid,
    pub role: String,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        AppError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    let claims = TokenIssuer::new(&state.config.jwt).validate(bearer.token())?;
    let employee_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

    request.extensions_mut().insert(AuthUser {
        employee_id,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
