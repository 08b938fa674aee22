//! Typed access to a collection.
//!
//! [`Repository`] wraps a [`CrudOrchestrator`] and converts entities to and
//! from a model type, so application code never handles raw JSON maps.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use quire_audit::AuditPage;
use quire_core::{Entity, EntityId, PageRequest, PageResult};

use crate::error::OrchestratorError;
use crate::orchestrator::CrudOrchestrator;

/// A model stored in a named collection.
///
/// The model's JSON form must be an object; a string `id` field, if present,
/// is the entity key.
pub trait EntityModel: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
}

/// Typed front end over a [`CrudOrchestrator`].
pub struct Repository<T> {
    orchestrator: Arc<CrudOrchestrator>,
    _model: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            _model: PhantomData,
        }
    }
}

impl<T: EntityModel> Repository<T> {
    /// Wrap `orchestrator`, which must serve `T::COLLECTION`.
    pub fn new(orchestrator: Arc<CrudOrchestrator>) -> Result<Self, OrchestratorError> {
        if orchestrator.collection() != T::COLLECTION {
            return Err(OrchestratorError::Configuration(format!(
                "repository for {:?} given an orchestrator for {:?}",
                T::COLLECTION,
                orchestrator.collection()
            )));
        }
        Ok(Self {
            orchestrator,
            _model: PhantomData,
        })
    }

    pub fn orchestrator(&self) -> &Arc<CrudOrchestrator> {
        &self.orchestrator
    }

    pub async fn find_all(&self, request: &PageRequest) -> Result<PageResult<T>, OrchestratorError> {
        self.orchestrator.find_all(request).await?.try_map(decode)
    }

    pub async fn find_by_id(&self, id: &EntityId) -> Result<T, OrchestratorError> {
        decode(self.orchestrator.find_by_id(id).await?)
    }

    pub async fn exists(&self, id: &EntityId) -> Result<bool, OrchestratorError> {
        self.orchestrator.exists(id).await
    }

    pub async fn create(&self, model: &T, user_id: Option<&str>) -> Result<T, OrchestratorError> {
        let data = encode(model)?;
        decode(self.orchestrator.create(data, user_id).await?)
    }

    /// Apply a partial update. `patch` serializes to the fields to overwrite;
    /// typically a struct of `Option`s with `skip_serializing_if`.
    pub async fn update<P: Serialize>(
        &self,
        id: &EntityId,
        patch: &P,
        user_id: Option<&str>,
    ) -> Result<T, OrchestratorError> {
        let data = encode(patch)?;
        decode(self.orchestrator.update(id, data, user_id).await?)
    }

    pub async fn delete(&self, id: &EntityId, user_id: Option<&str>) -> Result<T, OrchestratorError> {
        decode(self.orchestrator.delete(id, user_id).await?)
    }

    pub async fn soft_delete(
        &self,
        id: &EntityId,
        user_id: Option<&str>,
    ) -> Result<T, OrchestratorError> {
        decode(self.orchestrator.soft_delete(id, user_id).await?)
    }

    pub async fn history(
        &self,
        id: &EntityId,
        limit: u32,
        offset: u32,
    ) -> Result<AuditPage, OrchestratorError> {
        self.orchestrator.history(id, limit, offset).await
    }
}

fn encode<P: Serialize + ?Sized>(value: &P) -> Result<Map<String, Value>, OrchestratorError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(OrchestratorError::Serialization(
            "model must serialize to a JSON object".into(),
        )),
        Err(e) => Err(OrchestratorError::Serialization(e.to_string())),
    }
}

fn decode<T: DeserializeOwned>(entity: Entity) -> Result<T, OrchestratorError> {
    entity
        .decode()
        .map_err(|e| OrchestratorError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use quire_audit_memory::MemoryAuditStore;
    use quire_core::{Filter, SortDirection};
    use quire_store::CollectionSchema;
    use quire_store_memory::MemoryEntityStore;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Company {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        employees: u32,
        #[serde(default = "active")]
        active: bool,
    }

    fn active() -> bool {
        true
    }

    impl EntityModel for Company {
        const COLLECTION: &'static str = "companies";
    }

    #[derive(Serialize)]
    struct CompanyPatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        employees: Option<u32>,
    }

    fn orchestrator(collection: &str) -> Arc<CrudOrchestrator> {
        Arc::new(
            CrudOrchestrator::builder()
                .store(Arc::new(MemoryEntityStore::new(collection).unwrap()))
                .audit(Arc::new(MemoryAuditStore::new()))
                .schema(
                    CollectionSchema::new(collection)
                        .unwrap()
                        .with_sortable(["employees"])
                        .unwrap(),
                )
                .build()
                .unwrap(),
        )
    }

    fn company(name: &str, employees: u32) -> Company {
        Company {
            id: None,
            name: name.into(),
            employees,
            active: true,
        }
    }

    #[test]
    fn collection_must_match() {
        assert!(Repository::<Company>::new(orchestrator("contacts")).is_err());
        assert!(Repository::<Company>::new(orchestrator("companies")).is_ok());
    }

    #[tokio::test]
    async fn typed_round_trip() {
        let repo = Repository::<Company>::new(orchestrator("companies")).unwrap();
        let acme = repo.create(&company("Acme", 10), Some("u1")).await.unwrap();
        let id = EntityId::new(acme.id.clone().unwrap());
        assert_eq!(acme.name, "Acme");

        let updated = repo
            .update(&id, &CompanyPatch { employees: Some(12) }, Some("u1"))
            .await
            .unwrap();
        assert_eq!(updated.employees, 12);
        assert_eq!(updated.name, "Acme");

        repo.create(&company("Globex", 3), None).await.unwrap();
        let page = repo
            .find_all(
                &PageRequest::new(1, 10)
                    .with_sort("employees", SortDirection::Desc)
                    .with_filter(Filter::gt("employees", 1)),
            )
            .await
            .unwrap();
        let names: Vec<&str> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Globex"]);

        let inactive = repo.soft_delete(&id, None).await.unwrap();
        assert!(!inactive.active);
        assert_eq!(repo.history(&id, 10, 0).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn non_object_patch_is_rejected() {
        let repo = Repository::<Company>::new(orchestrator("companies")).unwrap();
        let err = repo
            .update(&EntityId::new("x"), &42, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Serialization(_)));
    }
}
