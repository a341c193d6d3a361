//! HTTP middleware and request extractors

pub mod auth;
pub mod context;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
