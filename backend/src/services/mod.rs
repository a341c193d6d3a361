//! Orchestrators for the store ledger
//!
//! Each service is generic over the [`LedgerStore`](crate::ledger::LedgerStore)
//! it runs against.

pub mod audit;
pub mod auth;
pub mod import;
pub mod inventory;
pub mod orders;
pub mod shipment;
pub mod supply;

pub use audit::{AuditEvent, AuditRecorder, RequestContext};
pub use auth::{AuthService, TokenIssuer};
pub use import::ImportService;
pub use inventory::ProductService;
pub use orders::OrderService;
pub use shipment::ShipmentService;
pub use supply::SupplyService;
