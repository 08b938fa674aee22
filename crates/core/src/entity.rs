use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::EntityId;

/// Name of the primary key field in an entity's JSON representation.
pub const ID_FIELD: &str = "id";

/// Name of the optional boolean flag used for soft deletion.
pub const ACTIVE_FIELD: &str = "active";

/// An opaque record owned by an entity store.
///
/// Apart from the primary key and the optional `active` flag, the fields are
/// never interpreted by the data-access layer. The JSON form is a flat object
/// with the key under `"id"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Entity {
    /// Create an entity. Any `"id"` entry in `fields` is discarded in favor of `id`.
    #[must_use]
    pub fn new(id: EntityId, mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// Build an entity from a JSON object carrying a string `"id"`.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut fields) = value else {
            return Err(ValidationError::InvalidEntity(
                "entity must be a JSON object".into(),
            ));
        };
        match fields.remove(ID_FIELD) {
            Some(Value::String(id)) => Ok(Self {
                id: EntityId::new(id),
                fields,
            }),
            Some(_) => Err(ValidationError::InvalidEntity(
                "entity id must be a string".into(),
            )),
            None => Err(ValidationError::InvalidEntity("entity has no id".into())),
        }
    }

    /// The entity's primary key.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// All non-key fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a single field. `"id"` resolves to the primary key.
    pub fn get(&self, field: &str) -> Option<Value> {
        if field == ID_FIELD {
            return Some(Value::String(self.id.to_string()));
        }
        self.fields.get(field).cloned()
    }

    /// Whether the entity is active. Entities without a boolean `active`
    /// field are considered active.
    pub fn is_active(&self) -> bool {
        self.fields
            .get(ACTIVE_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Shallow-merge `patch` into the entity's fields. The key is never touched.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key != ID_FIELD {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    /// JSON object form, including the `"id"` field.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(ID_FIELD.to_owned(), Value::String(self.id.to_string()));
        Value::Object(map)
    }

    /// Decode into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}

/// Reject patches that attempt to modify the primary key.
pub fn ensure_key_untouched(patch: &Map<String, Value>) -> Result<(), ValidationError> {
    if patch.contains_key(ID_FIELD) {
        return Err(ValidationError::ImmutableField(ID_FIELD.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test helper expects an object"),
        }
    }

    #[test]
    fn serializes_flat_with_id() {
        let e = Entity::new(EntityId::new("c1"), obj(json!({"name": "Acme"})));
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v, json!({"id": "c1", "name": "Acme"}));
        let back: Entity = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn new_discards_id_in_fields() {
        let e = Entity::new(EntityId::new("c1"), obj(json!({"id": "other", "n": 1})));
        assert_eq!(e.id().as_str(), "c1");
        assert!(!e.fields().contains_key("id"));
    }

    #[test]
    fn from_value_requires_string_id() {
        assert!(Entity::from_value(json!({"name": "x"})).is_err());
        assert!(Entity::from_value(json!({"id": 7})).is_err());
        assert!(Entity::from_value(json!([1])).is_err());
        let e = Entity::from_value(json!({"id": "a", "x": true})).unwrap();
        assert_eq!(e.get("x"), Some(json!(true)));
        assert_eq!(e.get("id"), Some(json!("a")));
    }

    #[test]
    fn active_defaults_to_true() {
        let e = Entity::new(EntityId::new("a"), Map::new());
        assert!(e.is_active());
        let e = Entity::new(EntityId::new("a"), obj(json!({"active": false})));
        assert!(!e.is_active());
        let e = Entity::new(EntityId::new("a"), obj(json!({"active": "no"})));
        assert!(e.is_active());
    }

    #[test]
    fn patch_is_shallow_and_keeps_key() {
        let mut e = Entity::new(
            EntityId::new("a"),
            obj(json!({"name": "Acme", "meta": {"x": 1, "y": 2}})),
        );
        e.apply_patch(&obj(json!({"id": "b", "meta": {"x": 9}, "active": false})));
        assert_eq!(e.id().as_str(), "a");
        assert_eq!(e.get("meta"), Some(json!({"x": 9})));
        assert_eq!(e.get("name"), Some(json!("Acme")));
        assert!(!e.is_active());
    }

    #[test]
    fn patch_with_id_is_rejected() {
        assert!(ensure_key_untouched(&obj(json!({"name": "x"}))).is_ok());
        assert_eq!(
            ensure_key_untouched(&obj(json!({"id": "x"}))),
            Err(ValidationError::ImmutableField("id".into()))
        );
    }

    #[test]
    fn decode_into_typed_model() {
        #[derive(Deserialize)]
        struct Company {
            id: String,
            name: String,
        }
        let e = Entity::new(EntityId::new("c1"), obj(json!({"name": "Acme"})));
        let c: Company = e.decode().unwrap();
        assert_eq!(c.id, "c1");
        assert_eq!(c.name, "Acme");
    }
}
