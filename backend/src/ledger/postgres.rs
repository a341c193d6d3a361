//! PostgreSQL ledger store

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use shared::{
    AuditEntry, AuditQuery, CreateShipmentInput, NewAuditEntry, NewProduct, NewSupplyIntake,
    Order, OrderHeader, OrderLine, OrderTotals, Pagination, Product, Shipment, SupplyIntake,
    SupplyLine,
};

use super::{LedgerStore, LedgerTx};
use crate::error::{AppError, AppResult};

/// Ledger backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgLedger {
    db: PgPool,
}

impl PgLedger {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// An open PostgreSQL transaction
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStore for PgLedger {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> AppResult<PgLedgerTx> {
        let tx = self.db.begin().await?;
        Ok(PgLedgerTx { tx })
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    async fn find_product(&mut self, id: &str) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, supplier_id, price, stock, image_url,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(product)
    }

    async fn list_products(&mut self, page: &Pagination) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, supplier_id, price, stock, image_url,
                   created_at, updated_at
            FROM products
            ORDER BY name, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(products)
    }

    async fn insert_product(&mut self, product: &NewProduct) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, description, supplier_id, price, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, supplier_id, price, stock, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.supplier_id)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(product)
    }

    async fn upsert_product_additive(&mut self, product: &NewProduct) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, description, supplier_id, price, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                supplier_id = EXCLUDED.supplier_id,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                stock = products.stock + EXCLUDED.stock
            RETURNING id, name, description, supplier_id, price, stock, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.supplier_id)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(product)
    }

    async fn update_product_details(&mut self, product: &NewProduct) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $1, description = $2, supplier_id = $3, price = $4, image_url = $5
            WHERE id = $6
            RETURNING id, name, description, supplier_id, price, stock, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.supplier_id)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(&product.id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(product)
    }

    async fn delete_product(&mut self, id: &str) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products
            WHERE id = $1
            RETURNING id, name, description, supplier_id, price, stock, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(product)
    }

    async fn increment_stock(&mut self, id: &str, by: i32) -> AppResult<Option<i32>> {
        let stock = sqlx::query_scalar::<_, i32>(
            "UPDATE products SET stock = stock + $1 WHERE id = $2 RETURNING stock",
        )
        .bind(by)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(stock)
    }

    async fn decrement_stock(&mut self, id: &str, by: i32) -> AppResult<Option<i32>> {
        let stock = sqlx::query_scalar::<_, i32>(
            "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1 RETURNING stock",
        )
        .bind(by)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(stock)
    }

    async fn insert_order(&mut self, header: &OrderHeader) -> AppResult<Order> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (order_date, order_time, status, subtotal, discount, tax, total,
                                client_id, employee_id)
            VALUES ($1, $2, $3, 0, $4, $5, 0, $6, $7)
            RETURNING id, order_date, order_time, status, subtotal, discount, tax, total,
                      client_id, employee_id, created_at, updated_at
            "#,
        )
        .bind(header.order_date)
        .bind(header.order_time)
        .bind(&header.status)
        .bind(header.discount)
        .bind(header.tax)
        .bind(header.client_id)
        .bind(header.employee_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(order)
    }

    async fn find_order(&mut self, id: Uuid) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_date, order_time, status, subtotal, discount, tax, total,
                   client_id, employee_id, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(order)
    }

    async fn list_orders(&mut self, page: &Pagination) -> AppResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_date, order_time, status, subtotal, discount, tax, total,
                   client_id, employee_id, created_at, updated_at
            FROM orders
            ORDER BY order_date DESC, order_time DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(orders)
    }

    async fn update_order_header(&mut self, id: Uuid, header: &OrderHeader) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET order_date = $1, order_time = $2, status = $3, client_id = $4,
                employee_id = $5, discount = $6, tax = $7
            WHERE id = $8
            "#,
        )
        .bind(header.order_date)
        .bind(header.order_time)
        .bind(&header.status)
        .bind(header.client_id)
        .bind(header.employee_id)
        .bind(header.discount)
        .bind(header.tax)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_order_lines(&mut self, lines: &[OrderLine]) -> AppResult<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO order_lines (order_id, product_id, quantity, unit_price, subtotal) ",
        );
        builder.push_values(lines, |mut row, line| {
            row.push_bind(line.order_id)
                .push_bind(line.product_id.clone())
                .push_bind(line.quantity)
                .push_bind(line.unit_price)
                .push_bind(line.subtotal);
        });
        builder.build().execute(&mut *self.tx).await?;

        Ok(())
    }

    async fn delete_order_lines(&mut self, order_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM order_lines WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn order_lines(&mut self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT order_id, product_id, quantity, unit_price, subtotal
            FROM order_lines
            WHERE order_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(lines)
    }

    async fn sum_line_subtotals(&mut self, order_id: Uuid) -> AppResult<Decimal> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(subtotal), 0) FROM order_lines WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(sum)
    }

    async fn write_order_totals(&mut self, order_id: Uuid, totals: &OrderTotals) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET subtotal = $1, discount = $2, tax = $3, total = $4
            WHERE id = $5
            RETURNING id, order_date, order_time, status, subtotal, discount, tax, total,
                      client_id, employee_id, created_at, updated_at
            "#,
        )
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.tax)
        .bind(totals.total)
        .bind(order_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    async fn delete_order(&mut self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_shipment(&mut self, input: &CreateShipmentInput) -> AppResult<Shipment> {
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            INSERT INTO shipments (code, order_id, employee_id, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, order_id, status, employee_id, notes, delivery_photo,
                      created_at, delivered_at
            "#,
        )
        .bind(input.code.trim())
        .bind(input.order_id)
        .bind(input.employee_id)
        .bind(&input.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(shipment)
    }

    async fn find_shipment(&mut self, id: Uuid) -> AppResult<Option<Shipment>> {
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, code, order_id, status, employee_id, notes, delivery_photo,
                   created_at, delivered_at
            FROM shipments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(shipment)
    }

    async fn update_shipment(&mut self, shipment: &Shipment) -> AppResult<Shipment> {
        sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET status = $1, employee_id = $2, notes = $3, delivery_photo = $4, delivered_at = $5
            WHERE id = $6
            RETURNING id, code, order_id, status, employee_id, notes, delivery_photo,
                      created_at, delivered_at
            "#,
        )
        .bind(shipment.status)
        .bind(shipment.employee_id)
        .bind(&shipment.notes)
        .bind(&shipment.delivery_photo)
        .bind(shipment.delivered_at)
        .bind(shipment.id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipment".to_string()))
    }

    async fn delete_shipment(&mut self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shipments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn shipments_for_order(&mut self, order_id: Uuid) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, code, order_id, status, employee_id, notes, delivery_photo,
                   created_at, delivered_at
            FROM shipments
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(shipments)
    }

    async fn insert_supply_intake(&mut self, header: &NewSupplyIntake) -> AppResult<SupplyIntake> {
        let intake = sqlx::query_as::<_, SupplyIntake>(
            r#"
            INSERT INTO supply_intakes (arrival_date, arrival_time, supplier_id, carrier, employee_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, arrival_date, arrival_time, supplier_id, carrier, employee_id, created_at
            "#,
        )
        .bind(header.arrival_date)
        .bind(header.arrival_time)
        .bind(header.supplier_id)
        .bind(&header.carrier)
        .bind(header.employee_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(intake)
    }

    async fn find_supply_intake(&mut self, id: Uuid) -> AppResult<Option<SupplyIntake>> {
        let intake = sqlx::query_as::<_, SupplyIntake>(
            r#"
            SELECT id, arrival_date, arrival_time, supplier_id, carrier, employee_id, created_at
            FROM supply_intakes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(intake)
    }

    async fn list_supply_intakes(&mut self, page: &Pagination) -> AppResult<Vec<SupplyIntake>> {
        let intakes = sqlx::query_as::<_, SupplyIntake>(
            r#"
            SELECT id, arrival_date, arrival_time, supplier_id, carrier, employee_id, created_at
            FROM supply_intakes
            ORDER BY arrival_date DESC, arrival_time DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(intakes)
    }

    async fn delete_supply_intake(&mut self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM supply_intakes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_supply_line(&mut self, line: &SupplyLine) -> AppResult<()> {
        sqlx::query("INSERT INTO supply_lines (intake_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(line.intake_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn find_supply_line(
        &mut self,
        intake_id: Uuid,
        product_id: &str,
    ) -> AppResult<Option<SupplyLine>> {
        let line = sqlx::query_as::<_, SupplyLine>(
            r#"
            SELECT intake_id, product_id, quantity
            FROM supply_lines
            WHERE intake_id = $1 AND product_id = $2
            "#,
        )
        .bind(intake_id)
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(line)
    }

    async fn supply_lines(&mut self, intake_id: Uuid) -> AppResult<Vec<SupplyLine>> {
        let lines = sqlx::query_as::<_, SupplyLine>(
            r#"
            SELECT intake_id, product_id, quantity
            FROM supply_lines
            WHERE intake_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(intake_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(lines)
    }

    async fn update_supply_line(&mut self, line: &SupplyLine) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE supply_lines SET quantity = $1 WHERE intake_id = $2 AND product_id = $3",
        )
        .bind(line.quantity)
        .bind(line.intake_id)
        .bind(&line.product_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_supply_line(&mut self, intake_id: Uuid, product_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM supply_lines WHERE intake_id = $1 AND product_id = $2")
            .bind(intake_id)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_audit_entry(&mut self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        let entry = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (table_name, record_id, action, old_values, new_values,
                                   employee_id, ip_address, client_timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, table_name, record_id, action, old_values, new_values,
                      employee_id, ip_address, client_timestamp, created_at
            "#,
        )
        .bind(&entry.table_name)
        .bind(&entry.record_id)
        .bind(entry.action)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(entry.employee_id)
        .bind(&entry.ip_address)
        .bind(entry.client_timestamp)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(entry)
    }

    async fn audit_entries(&mut self, query: &AuditQuery) -> AppResult<Vec<AuditEntry>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, table_name, record_id, action, old_values, new_values,
                   employee_id, ip_address, client_timestamp, created_at
            FROM audit_log
            WHERE TRUE
            "#,
        );

        if let Some(table_name) = &query.table_name {
            builder.push(" AND table_name = ").push_bind(table_name.clone());
        }
        if let Some(record_id) = &query.record_id {
            builder.push(" AND record_id = ").push_bind(record_id.clone());
        }
        if let Some(action) = query.action {
            builder.push(" AND action = ").push_bind(action);
        }
        if let Some(employee_id) = query.employee_id {
            builder.push(" AND employee_id = ").push_bind(employee_id);
        }
        if let Some(from) = query.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            builder.push(" AND created_at <= ").push_bind(to);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.limit.unwrap_or(100).clamp(1, 1000))
            .push(" OFFSET ")
            .push_bind(query.offset.unwrap_or(0).max(0));

        let entries = builder
            .build_query_as::<AuditEntry>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(entries)
    }
}
