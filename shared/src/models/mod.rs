//! Domain models for the store operations backend

mod audit_entry;
mod order;
mod product;
mod shipment;
mod supply;

pub use audit_entry::*;
pub use order::*;
pub use product::*;
pub use shipment::*;
pub use supply::*;
