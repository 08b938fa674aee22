use async_trait::async_trait;
use dashmap::DashMap;

use quire_audit::error::AuditError;
use quire_audit::record::{AuditPage, AuditQuery, AuditRecord};
use quire_audit::store::AuditStore;

/// In-memory audit store using `DashMap`. Suitable for development and testing.
///
/// Records are keyed by record ID. Queries scan every record, so this store
/// is not meant for large histories.
#[derive(Default)]
pub struct MemoryAuditStore {
    records: DashMap<String, AuditRecord>,
}

impl MemoryAuditStore {
    /// Create a new empty in-memory audit store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AuditRecord>, AuditError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn query(&self, query: &AuditQuery) -> Result<AuditPage, AuditError> {
        let limit = query.effective_limit();
        let offset = query.effective_offset();

        let mut matching: Vec<AuditRecord> = self
            .records
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first; v7 ids order records written within the same instant.
        matching.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matching.len() as u64;
        let records = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(AuditPage {
            records,
            total,
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_audit::record::AuditChange;
    use quire_audit::testing::run_audit_conformance_tests;
    use quire_core::{EntityId, UserId};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryAuditStore::new();
        run_audit_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(MemoryAuditStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let record = AuditRecord::new(
                    AuditChange::Create { new: json!({"n": i}) },
                    "companies",
                    EntityId::new(format!("c{i}")),
                    UserId::new("u1"),
                );
                store.append(record).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len(), 32);
        let page = store.query(&AuditQuery::default()).await.unwrap();
        assert_eq!(page.total, 32);
        assert_eq!(page.records.len(), 32);
    }
}
