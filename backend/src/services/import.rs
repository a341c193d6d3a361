//! Bulk import reconciler
//!
//! Turns a loosely formatted spreadsheet export into one supply intake.
//! Rows with a missing code, a missing quantity or an unusable quantity are
//! skipped and counted; only a store failure aborts the import.

use std::collections::BTreeMap;

use shared::import::{extract_line, ImportRow};
use shared::{AuditTable, BulkImportInput, ImportReport, SupplyLine};

use super::audit::{AuditEvent, AuditRecorder, RequestContext};
use super::inventory::{self, StockChanges};
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, LedgerTx};

/// Parse CSV text into header-keyed rows.
///
/// Short records are padded with empty cells; a file that is not CSV at all
/// is a validation failure.
pub fn parse_csv(data: &[u8]) -> AppResult<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::validation("file", format!("Unreadable header row: {}", e)))?
        .clone();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::validation("file", "The file has no header row"));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::validation("file", format!("Unreadable record {}: {}", index + 1, e))
        })?;

        let row: ImportRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Reconciles import rows against the product catalogue
#[derive(Clone)]
pub struct ImportService<S> {
    ledger: S,
    audit: AuditRecorder<S>,
}

impl<S: LedgerStore> ImportService<S> {
    pub fn new(ledger: S) -> Self {
        Self {
            audit: AuditRecorder::new(ledger.clone()),
            ledger,
        }
    }

    /// Import all usable rows as a single intake.
    ///
    /// Unknown codes become zero-priced placeholder products. A code seen on
    /// several rows ends up as one line carrying the summed quantity.
    pub async fn import_rows(
        &self,
        ctx: &RequestContext,
        input: BulkImportInput,
        rows: Vec<ImportRow>,
    ) -> AppResult<ImportReport> {
        let mut tx = self.ledger.begin().await?;
        let intake = tx.insert_supply_intake(&input.header()).await?;

        let mut report = ImportReport {
            intake_id: intake.id,
            ..ImportReport::default()
        };
        let mut quantities: BTreeMap<String, i32> = BTreeMap::new();
        let mut changes = StockChanges::new();
        let mut events = vec![AuditEvent::created(AuditTable::SupplyIntakes, intake.id, &intake)];

        for (index, row) in rows.iter().enumerate() {
            let line = match extract_line(row) {
                Ok(line) => line,
                Err(reason) => {
                    report.rows_skipped += 1;
                    tracing::debug!(row = index + 1, %reason, "import row skipped");
                    continue;
                }
            };

            let (product, created) = inventory::resolve_or_create(
                &mut tx,
                &line.code,
                line.description.as_deref(),
                input.supplier_id,
            )
            .await?;
            if created {
                report.products_created += 1;
                events.push(AuditEvent::created(AuditTable::Products, &product.id, &product));
            }
            changes.touch(&product);

            inventory::increment(&mut tx, &product.id, line.quantity).await?;

            let total = quantities.entry(product.id.clone()).or_insert(0);
            *total = total.checked_add(line.quantity).ok_or_else(|| {
                AppError::InvalidQuantity(format!("Quantity for {} is out of range", product.id))
            })?;
            report.rows_processed += 1;
        }

        for (product_id, quantity) in &quantities {
            tx.insert_supply_line(&SupplyLine {
                intake_id: intake.id,
                product_id: product_id.clone(),
                quantity: *quantity,
            })
            .await?;
        }

        events.extend(changes.into_events(&mut tx).await?);
        tx.commit().await?;

        tracing::info!(
            intake_id = %intake.id,
            rows_processed = report.rows_processed,
            rows_skipped = report.rows_skipped,
            products_created = report.products_created,
            "bulk import committed"
        );
        self.audit.record(ctx, events).await;

        Ok(report)
    }

    /// Parse a CSV upload and import it
    pub async fn import_csv(
        &self,
        ctx: &RequestContext,
        input: BulkImportInput,
        data: &[u8],
    ) -> AppResult<ImportReport> {
        let rows = parse_csv(data)?;
        self.import_rows(ctx, input, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_keys_rows_by_header() {
        let rows = parse_csv(b"Codigo,Cant,Descripcion\nA1,16 pcs,Soap\nB2,3\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Codigo"], "A1");
        assert_eq!(rows[0]["Cant"], "16 pcs");
        assert_eq!(rows[1]["Descripcion"], "");
    }

    #[test]
    fn test_parse_csv_rejects_empty_file() {
        assert!(parse_csv(b"").is_err());
    }
}
