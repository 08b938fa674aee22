//! Field redaction for audit records.
//!
//! [`RedactingAuditStore`] wraps another store and scrubs sensitive fields
//! out of entity snapshots before they are persisted.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuditError;
use crate::record::{AuditPage, AuditQuery, AuditRecord};
use crate::store::AuditStore;

/// Configuration for field redaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactConfig {
    /// Field names or dotted paths to redact (e.g. `"password"`,
    /// `"billing.card_number"`). Matching is case-insensitive.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Text written in place of redacted values.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "[REDACTED]".to_owned()
}

impl RedactConfig {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            placeholder: default_placeholder(),
        }
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

/// Replaces matching fields of a JSON document with a placeholder.
#[derive(Debug, Clone)]
pub struct Redactor {
    /// Lowercased field names and paths.
    fields: Vec<String>,
    placeholder: Value,
}

impl Redactor {
    pub fn new(config: &RedactConfig) -> Self {
        Self {
            fields: config.fields.iter().map(|f| f.to_lowercase()).collect(),
            placeholder: Value::String(config.placeholder.clone()),
        }
    }

    /// Redact `value` in place, descending into objects and arrays.
    pub fn redact(&self, value: &mut Value) {
        self.redact_at(value, "");
    }

    fn redact_at(&self, value: &mut Value, path: &str) {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let name = key.to_lowercase();
                    let full_path = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{path}.{name}")
                    };
                    if self.fields.iter().any(|f| *f == name || *f == full_path) {
                        *child = self.placeholder.clone();
                    } else {
                        self.redact_at(child, &full_path);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.redact_at(item, path);
                }
            }
            _ => {}
        }
    }
}

/// An audit store wrapper that redacts snapshot fields before storage.
pub struct RedactingAuditStore {
    inner: Arc<dyn AuditStore>,
    redactor: Redactor,
}

impl RedactingAuditStore {
    pub fn new(inner: Arc<dyn AuditStore>, config: &RedactConfig) -> Self {
        Self {
            inner,
            redactor: Redactor::new(config),
        }
    }
}

#[async_trait]
impl AuditStore for RedactingAuditStore {
    async fn append(&self, mut record: AuditRecord) -> Result<(), AuditError> {
        for snapshot in [&mut record.old_data, &mut record.new_data]
            .into_iter()
            .flatten()
        {
            self.redactor.redact(snapshot);
        }
        self.inner.append(record).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AuditRecord>, AuditError> {
        self.inner.get_by_id(id).await
    }

    async fn query(&self, query: &AuditQuery) -> Result<AuditPage, AuditError> {
        self.inner.query(query).await
    }
}
