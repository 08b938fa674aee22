use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(EntityId, "Primary key of an entity within its collection.");
newtype_string!(
    UserId,
    "Opaque caller identity supplied by the external identity provider."
);

impl EntityId {
    /// Generate a fresh, time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
}

impl From<uuid::Uuid> for EntityId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

impl UserId {
    /// Interpret an optional caller identity, treating the empty string as
    /// "no identity".
    #[must_use]
    pub fn from_optional(value: Option<&str>) -> Option<Self> {
        value.filter(|v| !v.is_empty()).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_from_str() {
        let id = EntityId::from("company-1");
        assert_eq!(id.as_str(), "company-1");
        assert_eq!(&*id, "company-1");
    }

    #[test]
    fn newtype_serde_is_transparent() {
        let id = EntityId::new("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_ids_are_unique_and_parse_as_uuid() {
        let a = EntityId::generate();
        let b = EntityId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn empty_user_is_absent() {
        assert_eq!(UserId::from_optional(None), None);
        assert_eq!(UserId::from_optional(Some("")), None);
        assert_eq!(
            UserId::from_optional(Some("u1")),
            Some(UserId::new("u1"))
        );
    }
}
