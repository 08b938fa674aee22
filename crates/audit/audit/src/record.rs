use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use quire_core::{EntityId, UserId};

use crate::error::AuditError;

/// Kind of mutation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(AuditError::Serialization(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// The snapshots a mutation carries. Each variant holds exactly the
/// snapshots its action allows: creates have only the new state, deletes
/// only the old, updates both.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditChange {
    Create { new: Value },
    Update { old: Value, new: Value },
    Delete { old: Value },
}

impl AuditChange {
    #[must_use]
    pub fn action(&self) -> AuditAction {
        match self {
            Self::Create { .. } => AuditAction::Create,
            Self::Update { .. } => AuditAction::Update,
            Self::Delete { .. } => AuditAction::Delete,
        }
    }

    fn into_snapshots(self) -> (Option<Value>, Option<Value>) {
        match self {
            Self::Create { new } => (None, Some(new)),
            Self::Update { old, new } => (Some(old), Some(new)),
            Self::Delete { old } => (Some(old), None),
        }
    }
}

/// One entry of the audit log. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier for this audit record (UUID v7).
    pub id: String,
    /// Caller that issued the mutation.
    pub user_id: UserId,
    pub action: AuditAction,
    /// Collection the entity belongs to.
    pub entity_type: String,
    pub entity_id: EntityId,
    /// State before the mutation (updates and deletes).
    pub old_data: Option<Value>,
    /// State after the mutation (creates and updates).
    pub new_data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        change: AuditChange,
        entity_type: impl Into<String>,
        entity_id: EntityId,
        user_id: UserId,
    ) -> Self {
        let action = change.action();
        let (old_data, new_data) = change.into_snapshots();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_id,
            action,
            entity_type: entity_type.into(),
            entity_id,
            old_data,
            new_data,
            timestamp: Utc::now(),
        }
    }
}

/// Query parameters for searching audit records.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Filter by collection.
    pub entity_type: Option<String>,
    /// Filter by entity key.
    pub entity_id: Option<EntityId>,
    /// Filter by caller.
    pub user_id: Option<UserId>,
    /// Filter by mutation kind.
    pub action: Option<AuditAction>,
    /// Only records written at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only records written at or before this time.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of records to return (default 50, max 1000).
    pub limit: Option<u32>,
    /// Number of records to skip for pagination.
    pub offset: Option<u32>,
}

impl AuditQuery {
    /// All records for one entity.
    pub fn for_entity(entity_type: impl Into<String>, entity_id: EntityId) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id),
            ..Self::default()
        }
    }

    /// Return the effective limit, clamped to 1..=1000, defaulting to 50.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 1000)
    }

    /// Return the effective offset, defaulting to 0.
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Whether `record` satisfies every filter in this query.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.entity_type
            .as_ref()
            .is_none_or(|t| *t == record.entity_type)
            && self.entity_id.as_ref().is_none_or(|id| *id == record.entity_id)
            && self.user_id.as_ref().is_none_or(|u| *u == record.user_id)
            && self.action.is_none_or(|a| a == record.action)
            && self.from.is_none_or(|from| record.timestamp >= from)
            && self.to.is_none_or(|to| record.timestamp <= to)
    }
}

/// A paginated page of audit records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    /// The records matching the query.
    pub records: Vec<AuditRecord>,
    /// Total number of records matching the query (before pagination).
    pub total: u64,
    /// The limit used for this page.
    pub limit: u32,
    /// The offset used for this page.
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(change: AuditChange) -> AuditRecord {
        AuditRecord::new(change, "companies", EntityId::new("c1"), UserId::new("u1"))
    }

    #[test]
    fn snapshots_follow_action() {
        let r = record(AuditChange::Create { new: json!({"a": 1}) });
        assert_eq!(r.action, AuditAction::Create);
        assert!(r.old_data.is_none());
        assert_eq!(r.new_data, Some(json!({"a": 1})));

        let r = record(AuditChange::Update {
            old: json!({"a": 1}),
            new: json!({"a": 2}),
        });
        assert_eq!(r.action, AuditAction::Update);
        assert!(r.old_data.is_some() && r.new_data.is_some());

        let r = record(AuditChange::Delete { old: json!({"a": 2}) });
        assert_eq!(r.action, AuditAction::Delete);
        assert!(r.new_data.is_none());
        assert_eq!(r.old_data, Some(json!({"a": 2})));
    }

    #[test]
    fn action_round_trips_through_str() {
        for action in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
        assert!("upsert".parse::<AuditAction>().is_err());
    }

    #[test]
    fn effective_limit_and_offset() {
        let q = AuditQuery::default();
        assert_eq!(q.effective_limit(), 50);
        assert_eq!(q.effective_offset(), 0);
        let q = AuditQuery {
            limit: Some(5000),
            offset: Some(7),
            ..AuditQuery::default()
        };
        assert_eq!(q.effective_limit(), 1000);
        assert_eq!(q.effective_offset(), 7);
        let q = AuditQuery {
            limit: Some(0),
            ..AuditQuery::default()
        };
        assert_eq!(q.effective_limit(), 1);
    }

    #[test]
    fn query_matching() {
        let r = record(AuditChange::Create { new: json!({}) });
        assert!(AuditQuery::default().matches(&r));
        assert!(AuditQuery::for_entity("companies", EntityId::new("c1")).matches(&r));
        assert!(!AuditQuery::for_entity("companies", EntityId::new("c2")).matches(&r));
        let q = AuditQuery {
            action: Some(AuditAction::Delete),
            ..AuditQuery::default()
        };
        assert!(!q.matches(&r));
        let q = AuditQuery {
            from: Some(r.timestamp + chrono::Duration::seconds(1)),
            ..AuditQuery::default()
        };
        assert!(!q.matches(&r));
    }

    #[test]
    fn ids_are_unique() {
        let a = record(AuditChange::Create { new: json!({}) });
        let b = record(AuditChange::Create { new: json!({}) });
        assert_ne!(a.id, b.id);
    }
}
