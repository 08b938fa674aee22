use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::AuditRecord;

/// A top-level field whose value differs between two snapshots.
///
/// `old` is `None` when the field was added, `new` is `None` when it was
/// removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Compare two snapshots field by field. Output is ordered by field name.
///
/// A missing snapshot behaves like an empty object, so a create lists every
/// field as added and a delete lists every field as removed. Non-object
/// snapshots are compared whole under the empty field name.
pub fn diff_snapshots(old: Option<&Value>, new: Option<&Value>) -> Vec<FieldChange> {
    if old.is_none() && new.is_none() {
        return Vec::new();
    }
    let empty = Map::new();
    let (Some(old_map), Some(new_map)) = (as_fields(old, &empty), as_fields(new, &empty)) else {
        if old == new {
            return Vec::new();
        }
        return vec![FieldChange {
            field: String::new(),
            old: old.cloned(),
            new: new.cloned(),
        }];
    };

    let fields: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
    fields
        .into_iter()
        .filter_map(|field| {
            let before = old_map.get(field);
            let after = new_map.get(field);
            (before != after).then(|| FieldChange {
                field: field.clone(),
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}

fn as_fields<'a>(
    snapshot: Option<&'a Value>,
    empty: &'a Map<String, Value>,
) -> Option<&'a Map<String, Value>> {
    match snapshot {
        None => Some(empty),
        Some(Value::Object(map)) => Some(map),
        Some(_) => None,
    }
}

impl AuditRecord {
    /// Per-field changes recorded by this entry.
    pub fn diff(&self) -> Vec<FieldChange> {
        diff_snapshots(self.old_data.as_ref(), self.new_data.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use quire_core::{EntityId, UserId};
    use serde_json::json;

    use super::*;
    use crate::record::AuditChange;

    #[test]
    fn update_lists_changed_added_and_removed_fields() {
        let old = json!({"id": "c1", "name": "Acme", "active": true, "city": "Paris"});
        let new = json!({"id": "c1", "name": "Acme Corp", "active": true, "size": 10});
        let changes = diff_snapshots(Some(&old), Some(&new));
        assert_eq!(
            changes,
            vec![
                FieldChange {
                    field: "city".into(),
                    old: Some(json!("Paris")),
                    new: None,
                },
                FieldChange {
                    field: "name".into(),
                    old: Some(json!("Acme")),
                    new: Some(json!("Acme Corp")),
                },
                FieldChange {
                    field: "size".into(),
                    old: None,
                    new: Some(json!(10)),
                },
            ]
        );
    }

    #[test]
    fn create_lists_every_field_as_added() {
        let record = AuditRecord::new(
            AuditChange::Create {
                new: json!({"id": "c1", "name": "Acme"}),
            },
            "companies",
            EntityId::new("c1"),
            UserId::new("u1"),
        );
        let changes = record.diff();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.old.is_none()));
    }

    #[test]
    fn identical_snapshots_have_no_diff() {
        let v = json!({"a": [1, 2]});
        assert!(diff_snapshots(Some(&v), Some(&v)).is_empty());
        assert!(diff_snapshots(None, None).is_empty());
    }

    #[test]
    fn scalar_snapshots_compare_whole() {
        let changes = diff_snapshots(Some(&json!(1)), Some(&json!(2)));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "");
    }
}
