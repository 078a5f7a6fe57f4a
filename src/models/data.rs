//! Entity records: persistent field containers with typed accessors.
//!
//! A record stores *only the fields explicitly set*; reading an unset
//! field resolves to the field's default. Records never mutate — every
//! write returns a new record — and the backing map is shared through an
//! [`Arc`], so a write clones one small node map while every unchanged
//! [`FieldValue`] keeps its storage. Writing a value equal to the
//! field's resolved current value is a no-op that shares the map
//! wholesale.
//!
//! [`TaskData`], [`ResourceData`], and [`AssignmentData`] are the three
//! instantiations of [`EntityData`]; each carries typed accessors over
//! the raw `get_value`/`set_value` contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::duration::Duration;
use super::fields::{
    AssignmentField, ConstraintType, FieldValue, ProjectField, ResourceField, TaskField,
};
use super::ident::{AssignmentId, ResourceId, TaskId};
use super::link::TaskLink;
use crate::error::{Result, SchedError};

// ================================
// Field map
// ================================

/// Persistent field-to-value map with structural sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap<F: ProjectField> {
    values: Arc<BTreeMap<F, FieldValue>>,
}

impl<F: ProjectField> FieldMap<F> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(BTreeMap::new()),
        }
    }

    /// The stored value, or the field default when unset.
    pub fn get(&self, field: F) -> FieldValue {
        self.values
            .get(&field)
            .cloned()
            .unwrap_or_else(|| field.default_value())
    }

    /// Whether the field is explicitly set.
    pub fn has_value(&self, field: F) -> bool {
        self.values.contains_key(&field)
    }

    /// A new map with the field set; a resolved no-op shares the map.
    pub fn set_item(&self, field: F, value: FieldValue) -> Self {
        if self.get(field) == value {
            return self.clone();
        }
        let mut values = (*self.values).clone();
        values.insert(field, value);
        Self {
            values: Arc::new(values),
        }
    }

    /// A new map with the field unset; a no-op shares the map.
    pub fn remove_item(&self, field: F) -> Self {
        if !self.has_value(field) {
            return self.clone();
        }
        let mut values = (*self.values).clone();
        values.remove(&field);
        Self {
            values: Arc::new(values),
        }
    }

    /// Iterates the explicitly-set fields in registry order.
    pub fn set_fields(&self) -> impl Iterator<Item = (F, &FieldValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    /// Whether both maps share the same backing storage. Holds after
    /// any chain of resolved no-op writes.
    pub(crate) fn shares(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl<F: ProjectField> Default for FieldMap<F> {
    fn default() -> Self {
        Self::new()
    }
}

// ================================
// Entity records
// ================================

/// An immutable entity record: an identifier plus a [`FieldMap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData<I, F: ProjectField> {
    id: I,
    fields: FieldMap<F>,
}

pub type TaskData = EntityData<TaskId, TaskField>;
pub type ResourceData = EntityData<ResourceId, ResourceField>;
pub type AssignmentData = EntityData<AssignmentId, AssignmentField>;

impl<I: Copy, F: ProjectField> EntityData<I, F> {
    pub fn id(&self) -> I {
        self.id
    }

    /// The stored value, or the field default when unset.
    pub fn get_value(&self, field: F) -> FieldValue {
        self.fields.get(field)
    }

    pub fn has_value(&self, field: F) -> bool {
        self.fields.has_value(field)
    }

    /// Iterates the explicitly-set fields; diffing walks this.
    pub fn set_fields(&self) -> impl Iterator<Item = (F, &FieldValue)> {
        self.fields.set_fields()
    }

    /// A new record with the field set, enforcing the field contract:
    /// computed and read-only fields reject the write, and the value's
    /// variant must match the field's declared kind.
    pub fn set_value(&self, field: F, value: FieldValue) -> Result<Self> {
        let def = field.definition();
        if def.computed {
            return Err(SchedError::ComputedField { field: def.name });
        }
        if def.read_only {
            return Err(SchedError::ReadOnlyField { field: def.name });
        }
        if !value.matches(def.kind) {
            return Err(SchedError::TypeMismatch {
                field: def.name,
                expected: def.kind,
                actual: value.kind(),
            });
        }
        Ok(self.with_value(field, value))
    }

    /// Unchecked store for scheduler-owned and structural writes.
    pub(crate) fn with_value(&self, field: F, value: FieldValue) -> Self {
        Self {
            id: self.id,
            fields: self.fields.set_item(field, value),
        }
    }

    pub(crate) fn without_value(&self, field: F) -> Self {
        Self {
            id: self.id,
            fields: self.fields.remove_item(field),
        }
    }

    /// Whether both records share field storage; holds when every write
    /// between them was a resolved no-op.
    pub(crate) fn shares_fields(&self, other: &Self) -> bool {
        self.fields.shares(&other.fields)
    }
}

impl TaskData {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
        }
    }

    pub fn name(&self) -> String {
        self.get_value(TaskField::Name)
            .as_text()
            .unwrap_or_default()
            .to_string()
    }

    /// 0-based dense position; doubles as the text reference number.
    pub fn ordinal(&self) -> usize {
        self.get_value(TaskField::Ordinal)
            .as_integer()
            .unwrap_or_default()
            .max(0) as usize
    }

    pub fn duration(&self) -> Duration {
        self.get_value(TaskField::Duration)
            .as_duration()
            .unwrap_or_default()
    }

    pub fn work(&self) -> Duration {
        self.get_value(TaskField::Work)
            .as_duration()
            .unwrap_or_default()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::Start).as_date().flatten()
    }

    pub fn finish(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::Finish).as_date().flatten()
    }

    pub fn early_start(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::EarlyStart).as_date().flatten()
    }

    pub fn early_finish(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::EarlyFinish).as_date().flatten()
    }

    pub fn late_start(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::LateStart).as_date().flatten()
    }

    pub fn late_finish(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::LateFinish).as_date().flatten()
    }

    pub fn start_slack(&self) -> Duration {
        self.get_value(TaskField::StartSlack)
            .as_duration()
            .unwrap_or_default()
    }

    pub fn finish_slack(&self) -> Duration {
        self.get_value(TaskField::FinishSlack)
            .as_duration()
            .unwrap_or_default()
    }

    pub fn total_slack(&self) -> Duration {
        self.get_value(TaskField::TotalSlack)
            .as_duration()
            .unwrap_or_default()
    }

    pub fn is_critical(&self) -> bool {
        self.get_value(TaskField::Critical)
            .as_bool()
            .unwrap_or_default()
    }

    pub fn constraint_type(&self) -> ConstraintType {
        self.get_value(TaskField::ConstraintType)
            .as_constraint()
            .unwrap_or_default()
    }

    pub fn constraint_date(&self) -> Option<NaiveDateTime> {
        self.get_value(TaskField::ConstraintDate)
            .as_date()
            .flatten()
    }

    /// Links with this task as successor, ordered by predecessor ordinal.
    pub fn predecessor_links(&self) -> Arc<[TaskLink]> {
        self.get_value(TaskField::PredecessorLinks)
            .as_links()
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Links with this task as predecessor, ordered by successor ordinal.
    pub fn successor_links(&self) -> Arc<[TaskLink]> {
        self.get_value(TaskField::SuccessorLinks)
            .as_links()
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }
}

impl ResourceData {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
        }
    }

    pub fn name(&self) -> String {
        self.get_value(ResourceField::Name)
            .as_text()
            .unwrap_or_default()
            .to_string()
    }

    pub fn initials(&self) -> String {
        self.get_value(ResourceField::Initials)
            .as_text()
            .unwrap_or_default()
            .to_string()
    }
}

impl AssignmentData {
    /// Creates an assignment bound to its task and resource. The two
    /// references are fixed for the record's lifetime.
    pub fn new(id: AssignmentId, task: TaskId, resource: ResourceId) -> Self {
        let record = Self {
            id,
            fields: FieldMap::new(),
        };
        record
            .with_value(AssignmentField::Task, FieldValue::TaskRef(task))
            .with_value(AssignmentField::Resource, FieldValue::ResourceRef(resource))
    }

    pub fn task(&self) -> TaskId {
        self.get_value(AssignmentField::Task)
            .as_task_ref()
            .unwrap_or_default()
    }

    pub fn resource(&self) -> ResourceId {
        self.get_value(AssignmentField::Resource)
            .as_resource_ref()
            .unwrap_or_default()
    }

    /// Allocation fraction of a full-time resource; defaults to 1.0.
    pub fn units(&self) -> f64 {
        self.get_value(AssignmentField::Units)
            .as_percent()
            .unwrap_or(1.0)
    }

    pub fn work(&self) -> Duration {
        self.get_value(AssignmentField::Work)
            .as_duration()
            .unwrap_or_default()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.get_value(AssignmentField::Start).as_date().flatten()
    }

    pub fn finish(&self) -> Option<NaiveDateTime> {
        self.get_value(AssignmentField::Finish).as_date().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_fields_resolve_defaults() {
        let task = TaskData::new(TaskId::create());
        assert_eq!(task.name(), "");
        assert_eq!(task.duration(), Duration::zero());
        assert_eq!(task.constraint_type(), ConstraintType::AsSoonAsPossible);
        assert_eq!(task.start(), None);
        assert!(!task.has_value(TaskField::Duration));
    }

    #[test]
    fn test_set_value_stores_and_shares() {
        let task = TaskData::new(TaskId::create());
        let named = task
            .set_value(TaskField::Name, "Design".into())
            .unwrap();
        assert_eq!(named.name(), "Design");
        assert_eq!(task.name(), ""); // original untouched
        assert!(named.has_value(TaskField::Name));
    }

    #[test]
    fn test_set_default_value_is_a_noop() {
        let task = TaskData::new(TaskId::create());
        let same = task
            .set_value(TaskField::Work, Duration::zero().into())
            .unwrap();
        assert!(!same.has_value(TaskField::Work));
        assert_eq!(same, task);
    }

    #[test]
    fn test_set_value_rejects_kind_mismatch() {
        let task = TaskData::new(TaskId::create());
        let err = task
            .set_value(TaskField::Duration, FieldValue::Bool(true))
            .unwrap_err();
        assert!(matches!(err, SchedError::TypeMismatch { field: "Duration", .. }));
    }

    #[test]
    fn test_set_value_rejects_read_only_and_computed() {
        let task = TaskData::new(TaskId::create());
        assert!(matches!(
            task.set_value(TaskField::EarlyStart, FieldValue::Date(None)),
            Err(SchedError::ReadOnlyField { field: "Early Start" })
        ));
        assert!(matches!(
            task.set_value(TaskField::Predecessors, "0".into()),
            Err(SchedError::ComputedField { field: "Predecessors" })
        ));
    }

    #[test]
    fn test_duration_accepts_both_span_kinds() {
        let task = TaskData::new(TaskId::create());
        let t = task
            .set_value(TaskField::Duration, Duration::days(10).into())
            .unwrap()
            .set_value(TaskField::Work, Duration::hours(40).into())
            .unwrap();
        assert_eq!(t.duration(), Duration::days(10));
        assert_eq!(t.work(), Duration::hours(40));
    }

    #[test]
    fn test_set_fields_iterates_only_explicit() {
        let task = TaskData::new(TaskId::create())
            .set_value(TaskField::Name, "A".into())
            .unwrap()
            .set_value(TaskField::Duration, Duration::days(1).into())
            .unwrap();
        let set: Vec<TaskField> = task.set_fields().map(|(f, _)| f).collect();
        assert_eq!(set, vec![TaskField::Name, TaskField::Duration]);
    }

    #[test]
    fn test_assignment_refs_are_fixed() {
        let task_id = TaskId::create();
        let res_id = ResourceId::create();
        let a = AssignmentData::new(AssignmentId::create(), task_id, res_id);
        assert_eq!(a.task(), task_id);
        assert_eq!(a.resource(), res_id);
        assert_eq!(a.units(), 1.0);
        assert!(a
            .set_value(AssignmentField::Task, FieldValue::TaskRef(task_id))
            .is_err());
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let task = TaskData::new(TaskId::create())
            .set_value(TaskField::Name, "Build".into())
            .unwrap()
            .set_value(TaskField::Duration, Duration::days(3).into())
            .unwrap();
        let json = serde_json::to_string(&task).unwrap();
        let back: TaskData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
