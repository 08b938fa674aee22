use chrono::Duration;
use serde_json::json;

use quire_core::{EntityId, UserId};

use crate::error::AuditError;
use crate::record::{AuditAction, AuditChange, AuditQuery, AuditRecord};
use crate::store::AuditStore;

fn record(change: AuditChange, entity_id: &str, user: &str) -> AuditRecord {
    AuditRecord::new(
        change,
        "conf_companies",
        EntityId::new(entity_id),
        UserId::new(user),
    )
}

/// Run the full audit store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if the backend reports one during any step.
pub async fn run_audit_conformance_tests(store: &dyn AuditStore) -> Result<(), AuditError> {
    test_append_and_get(store).await?;
    test_get_missing(store).await?;
    test_query_by_entity_newest_first(store).await?;
    test_query_filters(store).await?;
    test_query_pagination(store).await?;
    Ok(())
}

async fn test_append_and_get(store: &dyn AuditStore) -> Result<(), AuditError> {
    let entry = record(
        AuditChange::Update {
            old: json!({"id": "c0", "name": "Acme"}),
            new: json!({"id": "c0", "name": "Acme Corp"}),
        },
        "c0",
        "u1",
    );
    store.append(entry.clone()).await?;

    let found = store
        .get_by_id(&entry.id)
        .await?
        .ok_or_else(|| AuditError::Storage("appended record not found".into()))?;
    assert_eq!(found.id, entry.id);
    assert_eq!(found.action, AuditAction::Update);
    assert_eq!(found.entity_id, entry.entity_id);
    assert_eq!(found.user_id, entry.user_id);
    assert_eq!(found.old_data, entry.old_data);
    assert_eq!(found.new_data, entry.new_data);
    assert_eq!(
        found.timestamp.timestamp_micros(),
        entry.timestamp.timestamp_micros(),
        "timestamp should survive storage at microsecond precision"
    );
    Ok(())
}

async fn test_get_missing(store: &dyn AuditStore) -> Result<(), AuditError> {
    let found = store.get_by_id("no-such-record").await?;
    assert!(found.is_none(), "get_by_id on missing id should return None");
    Ok(())
}

async fn test_query_by_entity_newest_first(store: &dyn AuditStore) -> Result<(), AuditError> {
    let mut create = record(AuditChange::Create { new: json!({"id": "c1"}) }, "c1", "u1");
    let mut update = record(
        AuditChange::Update {
            old: json!({"id": "c1"}),
            new: json!({"id": "c1", "x": 1}),
        },
        "c1",
        "u2",
    );
    let mut delete = record(AuditChange::Delete { old: json!({"id": "c1", "x": 1}) }, "c1", "u1");
    let base = create.timestamp;
    update.timestamp = base + Duration::seconds(1);
    delete.timestamp = base + Duration::seconds(2);
    create.timestamp = base;

    store.append(create.clone()).await?;
    store.append(update.clone()).await?;
    store.append(delete.clone()).await?;

    let page = store
        .query(&AuditQuery::for_entity("conf_companies", EntityId::new("c1")))
        .await?;
    assert_eq!(page.total, 3);
    let ids: Vec<&str> = page.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![delete.id.as_str(), update.id.as_str(), create.id.as_str()],
        "records should be newest first"
    );
    Ok(())
}

async fn test_query_filters(store: &dyn AuditStore) -> Result<(), AuditError> {
    let by_user = AuditQuery {
        entity_type: Some("conf_companies".into()),
        user_id: Some(UserId::new("u2")),
        ..AuditQuery::default()
    };
    assert_eq!(store.query(&by_user).await?.total, 1);

    let deletes = AuditQuery {
        action: Some(AuditAction::Delete),
        ..AuditQuery::default()
    };
    let page = store.query(&deletes).await?;
    assert_eq!(page.total, 1);
    assert!(page.records.iter().all(|r| r.action == AuditAction::Delete));

    let other_type = AuditQuery {
        entity_type: Some("conf_contacts".into()),
        ..AuditQuery::default()
    };
    assert_eq!(store.query(&other_type).await?.total, 0);
    Ok(())
}

async fn test_query_pagination(store: &dyn AuditStore) -> Result<(), AuditError> {
    let query = AuditQuery {
        limit: Some(2),
        offset: Some(1),
        ..AuditQuery::for_entity("conf_companies", EntityId::new("c1"))
    };
    let page = store.query(&query).await?;
    assert_eq!(page.total, 3, "total ignores pagination");
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.limit, 2);
    assert_eq!(page.offset, 1);
    assert_eq!(page.records[0].action, AuditAction::Update);
    Ok(())
}
