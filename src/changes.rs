//! Snapshot diffing.
//!
//! [`ProjectChanges::compute`] compares two project snapshots per
//! entity kind: identifiers only in the new snapshot are `added`, only
//! in the old are `removed`, and records present in both are compared
//! field by field. The field diff walks every field *set in either*
//! record and compares resolved values, so an unset field compares as
//! its default. Records that differ only by identity (equal values in
//! fresh storage) produce no entry at all, which keeps the diff about
//! values rather than object identity.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::models::{
    AssignmentField, AssignmentId, EntityData, FieldValue, ProjectData, ProjectField,
    ResourceField, ResourceId, TaskField, TaskId,
};

/// One field's before/after pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange<F: ProjectField> {
    pub field: F,
    pub old: FieldValue,
    pub new: FieldValue,
}

/// A changed record: its identifier and the fields that differ.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChanges<I, F: ProjectField> {
    pub id: I,
    pub fields: Vec<FieldChange<F>>,
}

/// Added, removed, and changed records of one entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<I, F: ProjectField> {
    pub added: Vec<I>,
    pub removed: Vec<I>,
    pub changed: Vec<EntityChanges<I, F>>,
}

impl<I, F: ProjectField> ChangeSet<I, F> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of entries across added, removed, and changed.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

impl<I, F: ProjectField> Default for ChangeSet<I, F> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

/// The full difference between two snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub tasks: ChangeSet<TaskId, TaskField>,
    pub resources: ChangeSet<ResourceId, ResourceField>,
    pub assignments: ChangeSet<AssignmentId, AssignmentField>,
}

impl ProjectChanges {
    /// Diffs `new` against `old`.
    pub fn compute(old: &ProjectData, new: &ProjectData) -> Self {
        Self {
            tasks: diff_kind(
                old.tasks().map(|t| (t.id(), t)).collect(),
                new.tasks().map(|t| (t.id(), t)).collect(),
            ),
            resources: diff_kind(
                old.resources().map(|r| (r.id(), r)).collect(),
                new.resources().map(|r| (r.id(), r)).collect(),
            ),
            assignments: diff_kind(
                old.assignments().map(|a| (a.id(), a)).collect(),
                new.assignments().map(|a| (a.id(), a)).collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.resources.is_empty() && self.assignments.is_empty()
    }
}

fn diff_kind<I: Copy + Ord, F: ProjectField>(
    old: BTreeMap<I, &Arc<EntityData<I, F>>>,
    new: BTreeMap<I, &Arc<EntityData<I, F>>>,
) -> ChangeSet<I, F> {
    let mut set = ChangeSet::default();
    for (id, record) in &new {
        match old.get(id) {
            None => set.added.push(*id),
            // Shared storage cannot differ.
            Some(prev) if Arc::ptr_eq(prev, record) => {}
            Some(prev) => {
                let fields = field_diff(prev, record);
                if !fields.is_empty() {
                    set.changed.push(EntityChanges { id: *id, fields });
                }
            }
        }
    }
    for id in old.keys() {
        if !new.contains_key(id) {
            set.removed.push(*id);
        }
    }
    set
}

/// Fields set in either record whose resolved values differ.
fn field_diff<I: Copy, F: ProjectField>(
    old: &EntityData<I, F>,
    new: &EntityData<I, F>,
) -> Vec<FieldChange<F>> {
    let mut fields: BTreeSet<F> = old.set_fields().map(|(f, _)| f).collect();
    fields.extend(new.set_fields().map(|(f, _)| f));
    fields
        .into_iter()
        .filter_map(|field| {
            let old = old.get_value(field);
            let new = new.get_value(field);
            (old != new).then(|| FieldChange { field, old, new })
        })
        .collect()
}
