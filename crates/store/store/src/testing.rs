use serde_json::{Map, Value, json};

use quire_core::{EntityId, Filter, SortDirection};

use crate::error::StoreError;
use crate::query::{ListQuery, SortKey, SortSpec};
use crate::store::EntityStore;

fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn ids(entities: &[quire_core::Entity]) -> Vec<&str> {
    entities.iter().map(|e| e.id().as_str()).collect()
}

/// Run the full entity store conformance test suite.
///
/// Call this from your backend's test module with a store over an empty
/// collection; the listing checks rely on knowing every row.
///
/// # Errors
///
/// Returns an error if the backend reports one during any step.
pub async fn run_store_conformance_tests(store: &dyn EntityStore) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_insert_and_get(store).await?;
    test_insert_generates_id(store).await?;
    test_insert_conflict(store).await?;
    test_update_merges(store).await?;
    test_delete_and_exists(store).await?;
    test_list_creation_order(store).await?;
    test_list_sorted_by_field(store).await?;
    test_list_and_count_filtered(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn EntityStore) -> Result<(), StoreError> {
    let found = store.get(&EntityId::new("conf-missing")).await?;
    assert!(found.is_none(), "get on missing id should return None");
    assert!(!store.exists(&EntityId::new("conf-missing")).await?);
    Ok(())
}

async fn test_insert_and_get(store: &dyn EntityStore) -> Result<(), StoreError> {
    let inserted = store
        .insert(obj(json!({"id": "conf-a", "name": "Acme", "employees": 10})))
        .await?;
    assert_eq!(inserted.id().as_str(), "conf-a");
    assert_eq!(inserted.get("name"), Some(json!("Acme")));

    let found = store.get(&EntityId::new("conf-a")).await?;
    assert_eq!(found.as_ref(), Some(&inserted), "get should return the stored entity");
    Ok(())
}

async fn test_insert_generates_id(store: &dyn EntityStore) -> Result<(), StoreError> {
    let inserted = store.insert(obj(json!({"name": "Generated"}))).await?;
    assert!(!inserted.id().is_empty(), "insert should assign an id");
    assert!(store.exists(inserted.id()).await?);
    assert!(store.delete(inserted.id()).await?);
    Ok(())
}

async fn test_insert_conflict(store: &dyn EntityStore) -> Result<(), StoreError> {
    let result = store
        .insert(obj(json!({"id": "conf-a", "name": "Duplicate"})))
        .await;
    assert!(
        matches!(result, Err(StoreError::Conflict(_))),
        "duplicate insert should conflict"
    );
    let found = store.get(&EntityId::new("conf-a")).await?;
    assert_eq!(
        found.and_then(|e| e.get("name")),
        Some(json!("Acme")),
        "original entity should remain"
    );
    Ok(())
}

async fn test_update_merges(store: &dyn EntityStore) -> Result<(), StoreError> {
    let id = EntityId::new("conf-a");
    let updated = store
        .update(&id, obj(json!({"employees": 12, "active": false})))
        .await?;
    let updated = updated.ok_or_else(|| StoreError::Backend("update lost the entity".into()))?;
    assert_eq!(updated.get("name"), Some(json!("Acme")), "untouched fields survive");
    assert_eq!(updated.get("employees"), Some(json!(12)));
    assert!(!updated.is_active());

    let missing = store
        .update(&EntityId::new("conf-nope"), obj(json!({"x": 1})))
        .await?;
    assert!(missing.is_none(), "update of missing id should return None");

    // Restore for later listing checks.
    store
        .update(&id, obj(json!({"employees": 10, "active": true})))
        .await?;
    Ok(())
}

async fn test_delete_and_exists(store: &dyn EntityStore) -> Result<(), StoreError> {
    store.insert(obj(json!({"id": "conf-del"}))).await?;
    let id = EntityId::new("conf-del");
    assert!(store.exists(&id).await?);
    assert!(store.delete(&id).await?, "delete should report existing");
    assert!(!store.exists(&id).await?);
    assert!(!store.delete(&id).await?, "second delete should report missing");
    Ok(())
}

async fn seed_listing(store: &dyn EntityStore) -> Result<(), StoreError> {
    store
        .insert(obj(json!({"id": "conf-b", "name": "Globex", "employees": 50})))
        .await?;
    store
        .insert(obj(json!({"id": "conf-c", "name": "Initech"})))
        .await?;
    store
        .insert(obj(json!({"id": "conf-d", "name": "Hooli", "employees": 5, "active": false})))
        .await?;
    Ok(())
}

async fn test_list_creation_order(store: &dyn EntityStore) -> Result<(), StoreError> {
    seed_listing(store).await?;

    let all = store.list(&ListQuery::all(0, 10)).await?;
    assert_eq!(ids(&all), vec!["conf-a", "conf-b", "conf-c", "conf-d"]);

    let second_page = store.list(&ListQuery::all(2, 2)).await?;
    assert_eq!(ids(&second_page), vec!["conf-c", "conf-d"]);

    let past_end = store.list(&ListQuery::all(10, 2)).await?;
    assert!(past_end.is_empty());

    let reversed = store
        .list(&ListQuery {
            sort: SortSpec {
                key: SortKey::CreationOrder,
                direction: SortDirection::Desc,
            },
            ..ListQuery::all(0, 1)
        })
        .await?;
    assert_eq!(ids(&reversed), vec!["conf-d"]);
    Ok(())
}

async fn test_list_sorted_by_field(store: &dyn EntityStore) -> Result<(), StoreError> {
    let by_employees = |direction| ListQuery {
        sort: SortSpec {
            key: SortKey::Field("employees".into()),
            direction,
        },
        ..ListQuery::all(0, 10)
    };

    let asc = store.list(&by_employees(SortDirection::Asc)).await?;
    assert_eq!(
        ids(&asc),
        vec!["conf-d", "conf-a", "conf-b", "conf-c"],
        "missing values sort last ascending"
    );

    let desc = store.list(&by_employees(SortDirection::Desc)).await?;
    assert_eq!(
        ids(&desc),
        vec!["conf-c", "conf-b", "conf-a", "conf-d"],
        "missing values sort first descending"
    );
    Ok(())
}

async fn test_list_and_count_filtered(store: &dyn EntityStore) -> Result<(), StoreError> {
    assert_eq!(store.count(None).await?, 4);

    let inactive = Filter::eq("active", false);
    assert_eq!(store.count(Some(&inactive)).await?, 1);

    let big_or_named = Filter::or(vec![
        Filter::gt("employees", 20),
        Filter::contains("name", "tech"),
    ]);
    let query = ListQuery {
        filter: Some(big_or_named.clone()),
        ..ListQuery::all(0, 10)
    };
    let hits = store.list(&query).await?;
    assert_eq!(ids(&hits), vec!["conf-b", "conf-c"]);
    assert_eq!(store.count(query.count_filter()).await?, 2);

    let small = Filter::and(vec![
        Filter::lte("employees", 10),
        Filter::ne("name", "Hooli"),
    ]);
    assert_eq!(store.count(Some(&small)).await?, 1);

    let none = Filter::contains("name", "zzz");
    assert_eq!(store.count(Some(&none)).await?, 0);
    Ok(())
}
