//! Shared types and models for the store operations backend
//!
//! This crate contains the domain models, the order total calculator, the
//! import row parser and the audit snapshot helpers. Everything here is pure
//! so it can be shared between the backend and the admin panel (via WASM).

pub mod audit;
pub mod import;
pub mod models;
pub mod totals;
pub mod types;
pub mod validation;

pub use models::*;
pub use totals::*;
pub use types::*;
pub use validation::*;
