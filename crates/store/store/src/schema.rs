use std::collections::BTreeSet;

use quire_core::{ID_FIELD, ValidationError, validate_collection_name, validate_field_name};

/// Default upper bound on `PageRequest::limit`.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Maximum nesting depth accepted for filter trees.
pub const MAX_FILTER_DEPTH: usize = 16;

/// Declares what the query layer may assume about a collection.
///
/// A schema without a field list is *open*: any well-formed field name may be
/// filtered on. Without a sortable list, every known field is sortable. The
/// primary key is always known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    name: String,
    fields: Option<BTreeSet<String>>,
    sortable: Option<BTreeSet<String>>,
    max_page_size: u32,
}

impl CollectionSchema {
    /// Create an open schema for `name`.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_collection_name(&name)?;
        Ok(Self {
            name,
            fields: None,
            sortable: None,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        })
    }

    /// Restrict the collection to a closed set of fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(collect_names(fields)?);
        Ok(self)
    }

    /// Restrict sorting to the given fields.
    pub fn with_sortable<I, S>(mut self, fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sortable = collect_names(fields)?;
        if let Some(unknown) = sortable.iter().find(|f| !self.is_known(f)) {
            return Err(ValidationError::UnknownField(unknown.clone()));
        }
        self.sortable = Some(sortable);
        Ok(self)
    }

    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    pub fn is_open(&self) -> bool {
        self.fields.is_none()
    }

    /// Whether `field` may appear in a filter.
    pub fn is_known(&self, field: &str) -> bool {
        field == ID_FIELD || self.fields.as_ref().is_none_or(|f| f.contains(field))
    }

    /// Whether results may be ordered by `field`.
    pub fn is_sortable(&self, field: &str) -> bool {
        self.is_known(field) && self.sortable.as_ref().is_none_or(|s| s.contains(field))
    }
}

fn collect_names<I, S>(fields: I) -> Result<BTreeSet<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .map(|f| {
            let f = f.into();
            validate_field_name(&f).map(|()| f)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_schema_knows_everything() {
        let schema = CollectionSchema::new("companies").unwrap();
        assert!(schema.is_open());
        assert!(schema.is_known("anything"));
        assert!(schema.is_sortable("anything"));
        assert_eq!(schema.max_page_size(), DEFAULT_MAX_PAGE_SIZE);
    }

    #[test]
    fn closed_schema_limits_fields() {
        let schema = CollectionSchema::new("companies")
            .unwrap()
            .with_fields(["name", "active", "employees"])
            .unwrap()
            .with_sortable(["name"])
            .unwrap();
        assert!(schema.is_known("id"));
        assert!(schema.is_known("employees"));
        assert!(!schema.is_known("revenue"));
        assert!(schema.is_sortable("name"));
        assert!(!schema.is_sortable("employees"));
    }

    #[test]
    fn sortable_must_be_known() {
        let err = CollectionSchema::new("companies")
            .unwrap()
            .with_fields(["name"])
            .unwrap()
            .with_sortable(["revenue"])
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownField("revenue".into()));
    }

    #[test]
    fn rejects_bad_names() {
        assert!(CollectionSchema::new("bad-name").is_err());
        assert!(
            CollectionSchema::new("ok")
                .unwrap()
                .with_fields(["data->>x"])
                .is_err()
        );
    }

    #[test]
    fn max_page_size_is_at_least_one() {
        let schema = CollectionSchema::new("c").unwrap().with_max_page_size(0);
        assert_eq!(schema.max_page_size(), 1);
    }
}
