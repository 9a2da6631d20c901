//! Audit record structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::{field_changes, FieldChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    /// Whole-store replacement from a backup
    Restore,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
            Action::Restore => "RESTORE",
        };
        f.write_str(label)
    }
}

/// Kinds of records that leave an audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Client,
    Service,
    Billing,
    Settings,
    Backup,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntityType::Client => "Client",
            EntityType::Service => "Service",
            EntityType::Billing => "Billing",
            EntityType::Settings => "Settings",
            EntityType::Backup => "Backup",
        };
        f.write_str(label)
    }
}

/// One line of the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub action: Action,
    pub entity: EntityType,
    pub entity_id: String,

    /// Short label for humans (client name, backup file, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// Top-level fields that differ between `before` and `after`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

impl AuditEntry {
    fn new(action: Action, entity: EntityType, entity_id: impl ToString) -> Self {
        Self {
            at: Utc::now(),
            action,
            entity,
            entity_id: entity_id.to_string(),
            label: None,
            before: None,
            after: None,
            changes: Vec::new(),
        }
    }

    pub fn created<T: Serialize>(entity: EntityType, id: impl ToString, record: &T) -> Self {
        Self {
            after: serde_json::to_value(record).ok(),
            ..Self::new(Action::Create, entity, id)
        }
    }

    /// Update record; the field diff is computed from both snapshots
    pub fn updated<T: Serialize>(
        entity: EntityType,
        id: impl ToString,
        before: &T,
        after: &T,
    ) -> Self {
        let before = serde_json::to_value(before).ok();
        let after = serde_json::to_value(after).ok();
        let changes = match (&before, &after) {
            (Some(b), Some(a)) => field_changes(b, a),
            _ => Vec::new(),
        };

        Self {
            before,
            after,
            changes,
            ..Self::new(Action::Update, entity, id)
        }
    }

    pub fn deleted<T: Serialize>(entity: EntityType, id: impl ToString, record: &T) -> Self {
        Self {
            before: serde_json::to_value(record).ok(),
            ..Self::new(Action::Delete, entity, id)
        }
    }

    pub fn restored(backup_id: impl ToString, file_name: &str) -> Self {
        Self {
            label: Some(file_name.to_string()),
            ..Self::new(Action::Restore, EntityType::Backup, backup_id)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// One-line rendering, e.g. `[2025-03-01 10:00:00] UPDATE Client 4 (Ana): fee 15000 -> 18000`
    pub fn summary(&self) -> String {
        let mut line = format!(
            "[{}] {} {} {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            self.entity,
            self.entity_id
        );

        if let Some(label) = &self.label {
            line.push_str(&format!(" ({})", label));
        }

        if !self.changes.is_empty() {
            let rendered: Vec<String> = self.changes.iter().map(ToString::to_string).collect();
            line.push_str(": ");
            line.push_str(&rendered.join(", "));
        }

        line
    }
}
