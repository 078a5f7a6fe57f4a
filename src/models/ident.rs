//! Identifier types for project entities.
//!
//! Tasks, resources, assignments, and projects are addressed by opaque
//! 128-bit values with value equality. The all-zero identifier is a
//! reserved sentinel meaning "no entity" and doubles as the `Default`.
//! Fresh identifiers come from `create()`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchedError};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh unique identifier.
            pub fn create() -> Self {
                Self(Uuid::new_v4())
            }

            /// The reserved "no entity" value.
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this is the reserved "no entity" value.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = SchedError;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| SchedError::parse("identifier", s))
            }
        }
    };
}

entity_id!(
    /// Identifies a task within a project.
    TaskId
);
entity_id!(
    /// Identifies a resource within a project.
    ResourceId
);
entity_id!(
    /// Identifies an assignment (task-resource pairing).
    AssignmentId
);
entity_id!(
    /// Identifies a project.
    ProjectId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_yields_distinct_values() {
        assert_ne!(TaskId::create(), TaskId::create());
    }

    #[test]
    fn test_default_is_nil() {
        assert_eq!(TaskId::default(), TaskId::nil());
        assert!(TaskId::default().is_nil());
        assert!(!TaskId::create().is_nil());
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let id = ResourceId::create();
        let parsed: ResourceId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<AssignmentId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = TaskId::create();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
