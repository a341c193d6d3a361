//! Audit trail models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of mutation recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "audit_action", rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

/// Ledger-bearing tables whose mutations are audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTable {
    Products,
    Orders,
    SupplyIntakes,
    Shipments,
}

impl AuditTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTable::Products => "products",
            AuditTable::Orders => "orders",
            AuditTable::SupplyIntakes => "supply_intakes",
            AuditTable::Shipments => "shipments",
        }
    }
}

/// A persisted audit record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: i64,
    pub table_name: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    /// `None` for system-initiated changes
    pub employee_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub client_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row values for a new audit record
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub table_name: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub employee_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub client_timestamp: Option<DateTime<Utc>>,
}

/// Filters for reading the audit trail
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub action: Option<AuditAction>,
    pub employee_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQuery {
    /// Whether an entry passes every filter that is set
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.table_name.as_deref().map_or(true, |t| entry.table_name == t)
            && self.record_id.as_deref().map_or(true, |r| entry.record_id == r)
            && self.action.map_or(true, |a| entry.action == a)
            && self.employee_id.map_or(true, |e| entry.employee_id == Some(e))
            && self.from.map_or(true, |from| entry.created_at >= from)
            && self.to.map_or(true, |to| entry.created_at <= to)
    }
}
