//! Ledger store: the transactional relational tables behind every operation
//!
//! Orchestrators only ever talk to a [`LedgerTx`]. Each business operation
//! opens one transaction, performs its row-level steps through it and either
//! commits or drops it (which rolls back). Two stores implement the seam:
//! [`PgLedger`] for PostgreSQL and [`MemoryLedger`] for tests and demos.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    AuditEntry, AuditQuery, CreateShipmentInput, NewAuditEntry, NewProduct, NewSupplyIntake,
    Order, OrderHeader, OrderLine, OrderTotals, Pagination, Product, Shipment, SupplyIntake,
    SupplyLine,
};

use crate::error::AppResult;

mod memory;
mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

/// A store able to open ledger transactions
#[async_trait]
pub trait LedgerStore: Clone + Send + Sync + 'static {
    type Tx: LedgerTx;

    /// Open a transaction. Dropping it without `commit` rolls it back.
    async fn begin(&self) -> AppResult<Self::Tx>;
}

/// Row-level primitives available inside one transaction
#[async_trait]
pub trait LedgerTx: Send {
    async fn commit(self) -> AppResult<()>;

    async fn rollback(self) -> AppResult<()>;

    // ---------------------------------------------------------------- products

    async fn find_product(&mut self, id: &str) -> AppResult<Option<Product>>;

    async fn list_products(&mut self, page: &Pagination) -> AppResult<Vec<Product>>;

    /// Insert a product; fails if the id is taken
    async fn insert_product(&mut self, product: &NewProduct) -> AppResult<Product>;

    /// Insert, or on id conflict replace the descriptive fields and add the
    /// incoming stock to the stock on hand
    async fn upsert_product_additive(&mut self, product: &NewProduct) -> AppResult<Product>;

    /// Replace the descriptive fields of an existing product. Stock is left alone.
    async fn update_product_details(&mut self, product: &NewProduct) -> AppResult<Option<Product>>;

    async fn delete_product(&mut self, id: &str) -> AppResult<Option<Product>>;

    /// Atomic `stock = stock + by`. Returns the new stock, `None` if the product is missing.
    async fn increment_stock(&mut self, id: &str, by: i32) -> AppResult<Option<i32>>;

    /// Atomic `stock = stock - by` guarded by `stock >= by`. Returns the new
    /// stock, `None` if the product is missing or the guard failed.
    async fn decrement_stock(&mut self, id: &str, by: i32) -> AppResult<Option<i32>>;

    // ------------------------------------------------------------------ orders

    /// Insert a header with zero subtotal and total
    async fn insert_order(&mut self, header: &OrderHeader) -> AppResult<Order>;

    async fn find_order(&mut self, id: Uuid) -> AppResult<Option<Order>>;

    async fn list_orders(&mut self, page: &Pagination) -> AppResult<Vec<Order>>;

    /// Write the scalar header fields; monetary totals are untouched
    async fn update_order_header(&mut self, id: Uuid, header: &OrderHeader) -> AppResult<bool>;

    async fn insert_order_lines(&mut self, lines: &[OrderLine]) -> AppResult<()>;

    async fn delete_order_lines(&mut self, order_id: Uuid) -> AppResult<u64>;

    async fn order_lines(&mut self, order_id: Uuid) -> AppResult<Vec<OrderLine>>;

    /// Sum of the persisted line subtotals; unpriced lines count as zero
    async fn sum_line_subtotals(&mut self, order_id: Uuid) -> AppResult<Decimal>;

    async fn write_order_totals(&mut self, order_id: Uuid, totals: &OrderTotals) -> AppResult<Order>;

    async fn delete_order(&mut self, id: Uuid) -> AppResult<bool>;

    // --------------------------------------------------------------- shipments

    async fn insert_shipment(&mut self, input: &CreateShipmentInput) -> AppResult<Shipment>;

    async fn find_shipment(&mut self, id: Uuid) -> AppResult<Option<Shipment>>;

    async fn update_shipment(&mut self, shipment: &Shipment) -> AppResult<Shipment>;

    async fn delete_shipment(&mut self, id: Uuid) -> AppResult<bool>;

    async fn shipments_for_order(&mut self, order_id: Uuid) -> AppResult<Vec<Shipment>>;

    // ------------------------------------------------------------------ supply

    async fn insert_supply_intake(&mut self, header: &NewSupplyIntake) -> AppResult<SupplyIntake>;

    async fn find_supply_intake(&mut self, id: Uuid) -> AppResult<Option<SupplyIntake>>;

    async fn list_supply_intakes(&mut self, page: &Pagination) -> AppResult<Vec<SupplyIntake>>;

    /// Delete the header; its lines go with it
    async fn delete_supply_intake(&mut self, id: Uuid) -> AppResult<bool>;

    /// Insert a line; fails if the (intake, product) pair already exists
    async fn insert_supply_line(&mut self, line: &SupplyLine) -> AppResult<()>;

    async fn find_supply_line(&mut self, intake_id: Uuid, product_id: &str)
        -> AppResult<Option<SupplyLine>>;

    async fn supply_lines(&mut self, intake_id: Uuid) -> AppResult<Vec<SupplyLine>>;

    async fn update_supply_line(&mut self, line: &SupplyLine) -> AppResult<bool>;

    async fn delete_supply_line(&mut self, intake_id: Uuid, product_id: &str) -> AppResult<bool>;

    // ------------------------------------------------------------------- audit

    async fn insert_audit_entry(&mut self, entry: &NewAuditEntry) -> AppResult<AuditEntry>;

    /// Matching entries, newest first
    async fn audit_entries(&mut self, query: &AuditQuery) -> AppResult<Vec<AuditEntry>>;
}
