//! Supply intake models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Header of a goods receipt from a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplyIntake {
    pub id: Uuid,
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub supplier_id: Uuid,
    pub carrier: Option<String>,
    pub employee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Quantity of one product received in an intake, keyed by (intake_id, product_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplyLine {
    pub intake_id: Uuid,
    pub product_id: String,
    pub quantity: i32,
}

/// Intake header together with its lines
#[derive(Debug, Clone, Serialize)]
pub struct SupplyIntakeWithLines {
    #[serde(flatten)]
    pub intake: SupplyIntake,
    pub lines: Vec<SupplyLine>,
}

/// Row values for a new intake header
#[derive(Debug, Clone, PartialEq)]
pub struct NewSupplyIntake {
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub supplier_id: Uuid,
    pub carrier: Option<String>,
    pub employee_id: Option<Uuid>,
}

/// A requested intake line
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SupplyLineInput {
    #[validate(length(min = 1, max = 64, message = "Product code is required"))]
    pub product_id: String,
    pub quantity: i32,
}

/// Input for a manual supply intake
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplyIntakeInput {
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub supplier_id: Uuid,
    #[validate(length(max = 100, message = "Carrier name is too long"))]
    pub carrier: Option<String>,
    pub employee_id: Option<Uuid>,
    pub lines: Vec<SupplyLineInput>,
}

impl CreateSupplyIntakeInput {
    pub fn header(&self) -> NewSupplyIntake {
        NewSupplyIntake {
            arrival_date: self.arrival_date,
            arrival_time: self.arrival_time,
            supplier_id: self.supplier_id,
            carrier: self.carrier.clone(),
            employee_id: self.employee_id,
        }
    }
}

/// Correction of the quantity received on one line
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateSupplyLineInput {
    pub quantity: i32,
}

/// Parameters accompanying a bulk import file
#[derive(Debug, Clone, Deserialize)]
pub struct BulkImportInput {
    pub supplier_id: Uuid,
    pub arrival_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub carrier: Option<String>,
    pub employee_id: Option<Uuid>,
}

impl BulkImportInput {
    pub fn header(&self) -> NewSupplyIntake {
        NewSupplyIntake {
            arrival_date: self.arrival_date,
            arrival_time: self.arrival_time,
            supplier_id: self.supplier_id,
            carrier: self.carrier.clone(),
            employee_id: self.employee_id,
        }
    }
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub intake_id: Uuid,
    pub rows_processed: u32,
    pub rows_skipped: u32,
    pub products_created: u32,
}
