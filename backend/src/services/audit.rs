//! Audit recorder
//!
//! Orchestrators collect an [`AuditEvent`] for every ledger-bearing row they
//! create, change or remove, commit their own transaction, and only then hand
//! the events to [`AuditRecorder::record`]. The recorder writes them in a
//! separate short transaction. A failure there is logged and swallowed: the
//! business change is already durable and stays that way.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use shared::audit::{changed_fields, sanitize, snapshot};
use shared::{AuditAction, AuditEntry, AuditQuery, AuditTable, NewAuditEntry};

use crate::error::AppResult;
use crate::ledger::{LedgerStore, LedgerTx};

/// Who made a change and from where. Every field is optional; an empty
/// context marks a system-initiated change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub actor_id: Option<Uuid>,
    pub source_ip: Option<String>,
    pub client_timestamp: Option<DateTime<Utc>>,
}

impl RequestContext {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn actor(actor_id: Uuid) -> Self {
        Self {
            actor_id: Some(actor_id),
            ..Self::default()
        }
    }
}

/// One committed mutation, as an immutable before/after pair
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub table: AuditTable,
    pub record_id: String,
    pub action: AuditAction,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl AuditEvent {
    pub fn created<T: Serialize>(table: AuditTable, record_id: impl ToString, row: &T) -> Self {
        Self {
            table,
            record_id: record_id.to_string(),
            action: AuditAction::Create,
            before: None,
            after: Some(snapshot(row)),
        }
    }

    pub fn updated<T: Serialize>(
        table: AuditTable,
        record_id: impl ToString,
        before: &T,
        after: &T,
    ) -> Self {
        Self {
            table,
            record_id: record_id.to_string(),
            action: AuditAction::Update,
            before: Some(snapshot(before)),
            after: Some(snapshot(after)),
        }
    }

    pub fn deleted<T: Serialize>(table: AuditTable, record_id: impl ToString, row: &T) -> Self {
        Self {
            table,
            record_id: record_id.to_string(),
            action: AuditAction::Delete,
            before: Some(snapshot(row)),
            after: None,
        }
    }

    /// Row to persist, or `None` for an update that changed nothing
    pub fn into_entry(self, ctx: &RequestContext) -> Option<NewAuditEntry> {
        let (old_values, new_values) = match self.action {
            AuditAction::Create => (None, self.after.map(sanitize)),
            AuditAction::Delete => (self.before.map(sanitize), None),
            AuditAction::Update => {
                let before = self.before.unwrap_or(Value::Null);
                let after = self.after.unwrap_or(Value::Null);
                let changes = changed_fields(&before, &after)?;
                (
                    Some(sanitize(changes.old_values)),
                    Some(sanitize(changes.new_values)),
                )
            }
        };

        Some(NewAuditEntry {
            table_name: self.table.as_str().to_string(),
            record_id: self.record_id,
            action: self.action,
            old_values,
            new_values,
            employee_id: ctx.actor_id,
            ip_address: ctx.source_ip.clone(),
            client_timestamp: ctx.client_timestamp,
        })
    }
}

/// Writes audit entries after the fact, best effort
#[derive(Clone)]
pub struct AuditRecorder<S> {
    ledger: S,
}

impl<S: LedgerStore> AuditRecorder<S> {
    pub fn new(ledger: S) -> Self {
        Self { ledger }
    }

    /// Persist the entries for a committed operation. Never fails.
    pub async fn record(&self, ctx: &RequestContext, events: Vec<AuditEvent>) {
        let entries: Vec<NewAuditEntry> = events
            .into_iter()
            .filter_map(|event| event.into_entry(ctx))
            .collect();

        if entries.is_empty() {
            return;
        }

        let count = entries.len();
        match self.write(&entries).await {
            Ok(()) => tracing::debug!(count, "audit entries recorded"),
            Err(e) => tracing::warn!(
                error = %e,
                count,
                table = %entries[0].table_name,
                record_id = %entries[0].record_id,
                "failed to record audit entries"
            ),
        }
    }

    async fn write(&self, entries: &[NewAuditEntry]) -> AppResult<()> {
        let mut tx = self.ledger.begin().await?;
        for entry in entries {
            tx.insert_audit_entry(entry).await?;
        }
        tx.commit().await
    }

    /// Read the trail, newest first
    pub async fn list(&self, query: &AuditQuery) -> AppResult<Vec<AuditEntry>> {
        let mut tx = self.ledger.begin().await?;
        let entries = tx.audit_entries(query).await?;
        tx.rollback().await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_without_changes_is_dropped() {
        let row = json!({"id": "X", "stock": 3, "updated_at": "a"});
        let touched = json!({"id": "X", "stock": 3, "updated_at": "b"});
        let event = AuditEvent::updated(AuditTable::Products, "X", &row, &touched);
        assert!(event.into_entry(&RequestContext::system()).is_none());
    }

    #[test]
    fn test_create_entry_carries_context_and_redacts() {
        let actor = Uuid::new_v4();
        let ctx = RequestContext {
            actor_id: Some(actor),
            source_ip: Some("10.0.0.7".to_string()),
            client_timestamp: None,
        };
        let event = AuditEvent::created(
            AuditTable::Products,
            "X",
            &json!({"id": "X", "api_key": "abc"}),
        );

        let entry = event.into_entry(&ctx).unwrap();
        assert_eq!(entry.action, AuditAction::Create);
        assert_eq!(entry.table_name, "products");
        assert_eq!(entry.employee_id, Some(actor));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.7"));
        assert!(entry.old_values.is_none());
        assert_eq!(entry.new_values, Some(json!({"id": "X", "api_key": "[REDACTED]"})));
    }

    #[test]
    fn test_delete_entry_keeps_prior_state() {
        let event = AuditEvent::deleted(AuditTable::Orders, "o-1", &json!({"total": "20.00"}));
        let entry = event.into_entry(&RequestContext::system()).unwrap();
        assert_eq!(entry.old_values, Some(json!({"total": "20.00"})));
        assert!(entry.new_values.is_none());
        assert!(entry.employee_id.is_none());
    }
}
