//! Top-level field diff between two JSON snapshots

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single changed field. `None` means the field was absent on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: Option<Value>,
    pub to: Option<Value>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.field,
            render(self.from.as_ref()),
            render(self.to.as_ref())
        )
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        None => "(none)".to_string(),
        Some(Value::String(s)) if s.chars().count() > 40 => {
            let head: String = s.chars().take(37).collect();
            format!("\"{}...\"", head)
        }
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(map)) => format!("{{{} fields}}", map.len()),
        Some(other) => other.to_string(),
    }
}

/// Fields whose values differ, in key order. Timestamps are ignored.
///
/// Non-object snapshots compare as a single unnamed field.
pub fn field_changes(before: &Value, after: &Value) -> Vec<FieldChange> {
    let (Value::Object(before), Value::Object(after)) = (before, after) else {
        if before == after {
            return Vec::new();
        }
        return vec![FieldChange {
            field: String::new(),
            from: Some(before.clone()),
            to: Some(after.clone()),
        }];
    };

    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter(|key| key.as_str() != "updatedAt" && key.as_str() != "createdAt")
        .filter_map(|key| {
            let from = before.get(key);
            let to = after.get(key);
            (from != to).then(|| FieldChange {
                field: key.clone(),
                from: from.cloned(),
                to: to.cloned(),
            })
        })
        .collect()
}
