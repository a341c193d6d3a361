//! Authentication service for employee login and token validation

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Employee ID
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issued access token
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Employee credentials row
#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: Uuid,
    password_hash: String,
    role: String,
    is_active: bool,
}

/// Signs and checks access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    expiry: i64,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            expiry: config.access_token_expiry,
        }
    }

    pub fn issue(&self, employee_id: Uuid, role: &str) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let claims = Claims {
            sub: employee_id.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(self.expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.expiry,
        })
    }

    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(db: PgPool, config: &JwtConfig) -> Self {
        Self {
            db,
            tokens: TokenIssuer::new(config),
        }
    }

    /// Check an employee's credentials and issue an access token
    pub async fn login(&self, input: &LoginInput) -> AppResult<AuthTokens> {
        shared::validate_email(input.email.trim()).map_err(|m| AppError::validation("email", m))?;

        let employee = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, password_hash, role, is_active
            FROM employees
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(input.email.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !employee.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let valid = verify(&input.password, &employee.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(employee_id = %employee.id, "employee logged in");
        self.tokens.issue(employee.id, &employee.role)
    }
}
