//! Error types for project mutations, field writes, and text parsing.
//!
//! Every fallible operation returns [`SchedError`] through the crate-wide
//! [`Result`] alias. Variants fall into five groups:
//! - Field access: kind mismatches, writes to read-only or computed fields
//! - Entity references: unknown or duplicate identifiers
//! - Dependency graph: duplicate links, links that would close a cycle
//! - Constraints: a date supplied to a date-free constraint type, or
//!   missing from a date-requiring one
//! - Text parsing: durations, dates, percentages, predecessor lists,
//!   resource lists
//!
//! The scheduler itself never fails; every condition it would have to
//! reject is caught during structural mutation, so a snapshot handed to
//! it is always schedulable.

use thiserror::Error;

use crate::models::{AssignmentId, ConstraintType, FieldKind, ResourceId, TaskId};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SchedError>;

/// Errors surfaced by snapshot mutations and parsers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchedError {
    /// A value's kind does not match the field's declared kind.
    #[error("field '{field}' holds {expected} values, got {actual}")]
    TypeMismatch {
        field: &'static str,
        expected: FieldKind,
        actual: FieldKind,
    },

    /// Write attempted on a scheduler-owned field.
    #[error("field '{field}' is read-only")]
    ReadOnlyField { field: &'static str },

    /// Write attempted on a computed field through the record API.
    #[error("field '{field}' is computed and cannot be stored")]
    ComputedField { field: &'static str },

    /// Assignment units must be a positive, finite fraction.
    #[error("assignment units must be positive, got {value}")]
    InvalidUnits { value: f64 },

    #[error("task {0} already exists")]
    DuplicateTask(TaskId),

    #[error("resource {0} already exists")]
    DuplicateResource(ResourceId),

    #[error("assignment {0} already exists")]
    DuplicateAssignment(AssignmentId),

    #[error("task {0} not found")]
    UnknownTask(TaskId),

    #[error("resource {0} not found")]
    UnknownResource(ResourceId),

    #[error("assignment {0} not found")]
    UnknownAssignment(AssignmentId),

    /// A link with the same endpoints is already present.
    #[error("link from task {predecessor} to task {successor} already exists")]
    DuplicateLink {
        predecessor: usize,
        successor: usize,
    },

    /// Admitting the link would close a dependency cycle.
    #[error("link from task {predecessor} to task {successor} would create a cycle")]
    LinkCycle {
        predecessor: usize,
        successor: usize,
    },

    /// No link connects the two tasks.
    #[error("no link from task {predecessor} to task {successor}")]
    UnknownLink {
        predecessor: usize,
        successor: usize,
    },

    /// A predecessor entry names an ordinal outside `[0, task_count)`.
    #[error("ordinal {ordinal} is out of range for {count} task(s)")]
    OrdinalOutOfRange { ordinal: usize, count: usize },

    /// The constraint type requires a date and none is stored.
    #[error("constraint '{0}' requires a date")]
    ConstraintDateRequired(ConstraintType),

    /// The constraint type forbids a date and one was supplied.
    #[error("constraint '{0}' does not take a date")]
    ConstraintDateNotAllowed(ConstraintType),

    #[error("calendar '{0}' not found")]
    UnknownCalendar(String),

    /// The project's current calendar cannot be removed from the set.
    #[error("calendar '{0}' is the current calendar and cannot be removed")]
    RemoveCurrentCalendar(String),

    /// Text that none of the kind parsers accept.
    #[error("cannot parse {kind} from {input:?}")]
    Parse { kind: &'static str, input: String },
}

impl SchedError {
    pub(crate) fn parse(kind: &'static str, input: impl Into<String>) -> Self {
        SchedError::Parse {
            kind,
            input: input.into(),
        }
    }
}
