//! HTTP handler for bulk supply imports
//!
//! Expects `multipart/form-data` with a CSV `file` part and the intake
//! fields `supplier_id`, `arrival_date`, `arrival_time` and optionally
//! `carrier` and `employee_id`.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared::{BulkImportInput, ImportReport};

use crate::error::{AppError, AppResult};
use crate::services::{ImportService, RequestContext};
use crate::AppState;

#[derive(Default)]
struct ImportForm {
    file: Option<Vec<u8>>,
    supplier_id: Option<String>,
    arrival_date: Option<String>,
    arrival_time: Option<String>,
    carrier: Option<String>,
    employee_id: Option<String>,
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(field, format!("{} is required", field)))
}

fn parse_uuid(raw: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(field, "Not a valid identifier"))
}

fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::validation("arrival_time", "Expected HH:MM or HH:MM:SS"))
}

impl ImportForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = ImportForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation("file", format!("Malformed upload: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation("file", format!("Malformed upload: {}", e)))?;
                form.file = Some(bytes.to_vec());
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::validation(name.clone(), e.to_string()))?;
            match name.as_str() {
                "supplier_id" => form.supplier_id = Some(text),
                "arrival_date" => form.arrival_date = Some(text),
                "arrival_time" => form.arrival_time = Some(text),
                "carrier" => form.carrier = Some(text),
                "employee_id" => form.employee_id = Some(text),
                _ => tracing::debug!(field = %name, "ignoring unknown upload field"),
            }
        }

        Ok(form)
    }

    fn into_parts(self) -> AppResult<(BulkImportInput, Vec<u8>)> {
        let file = self
            .file
            .ok_or_else(|| AppError::validation("file", "A CSV file is required"))?;

        let supplier_id = parse_uuid(&required(self.supplier_id, "supplier_id")?, "supplier_id")?;
        let arrival_date = NaiveDate::parse_from_str(&required(self.arrival_date, "arrival_date")?, "%Y-%m-%d")
            .map_err(|_| AppError::validation("arrival_date", "Expected YYYY-MM-DD"))?;
        let arrival_time = parse_time(&required(self.arrival_time, "arrival_time")?)?;
        let employee_id = self
            .employee_id
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| parse_uuid(&v, "employee_id"))
            .transpose()?;
        let carrier = self
            .carrier
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok((
            BulkImportInput {
                supplier_id,
                arrival_date,
                arrival_time,
                carrier,
                employee_id,
            },
            file,
        ))
    }
}

/// Import a spreadsheet export as one supply intake
pub async fn import_supply(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Multipart,
) -> AppResult<Json<ImportReport>> {
    let (input, file) = ImportForm::read(multipart).await?.into_parts()?;

    let service = ImportService::new(state.ledger);
    let report = service.import_csv(&ctx, input, &file).await?;
    Ok(Json(report))
}
