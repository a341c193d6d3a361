//! HTTP request handlers

pub mod audit;
pub mod auth;
pub mod health;
pub mod import;
pub mod orders;
pub mod products;
pub mod shipments;
pub mod supply;

pub use audit::*;
pub use auth::*;
pub use health::*;
pub use import::*;
pub use orders::*;
pub use products::*;
pub use shipments::*;
pub use supply::*;
