//! Field setter strategies.
//!
//! A handful of fields do more than store a value when written:
//!
//! - `Duration` re-levels the work of assignments that end with the
//!   task, then re-totals task work.
//! - `Work` on a task redistributes across its assignments; on an
//!   assignment it moves the task total by the delta.
//! - `Start`/`Finish` become a no-earlier-than constraint plus date.
//! - `Ordinal` reorders the task list.
//! - `Predecessors` and `ResourceNames` are text fields whose writes
//!   edit links and assignments; their reads are derived here too.
//!
//! Everything else flows through the record's own `set_value` checks.
//! Each strategy takes a snapshot and returns a new one; on error the
//! input snapshot is untouched.

use crate::error::{Result, SchedError};
use crate::models::{
    AssignmentField, AssignmentId, ConstraintType, Duration, FieldDefinition, FieldKind,
    FieldValue, PredecessorEntry, ProjectData, ProjectField, ResourceField, ResourceId, TaskData,
    TaskField, TaskId, TaskLink,
};

// ================================
// Entry points
// ================================

/// Applies a task field write, dispatching to its strategy.
pub(crate) fn set_task_field(
    data: &ProjectData,
    id: TaskId,
    field: TaskField,
    value: FieldValue,
) -> Result<ProjectData> {
    let task = data.task(id).cloned().ok_or(SchedError::UnknownTask(id))?;
    match field {
        TaskField::Duration => set_duration(data, &task, value),
        TaskField::Work => set_task_work(data, &task, value),
        TaskField::Start => {
            set_date_constraint(data, &task, field, ConstraintType::StartNoEarlierThan, value)
        }
        TaskField::Finish => {
            set_date_constraint(data, &task, field, ConstraintType::FinishNoEarlierThan, value)
        }
        TaskField::ConstraintType => set_constraint_type(data, &task, value),
        TaskField::ConstraintDate => set_constraint_date(data, &task, value),
        TaskField::Ordinal => set_ordinal(data, &task, value),
        TaskField::Predecessors => set_predecessor_text(data, &task, value),
        TaskField::ResourceNames => set_resource_names(data, &task, value),
        _ => Ok(data.with_task(task.set_value(field, value)?)),
    }
}

/// Applies a resource field write. Resource fields are plain stores.
pub(crate) fn set_resource_field(
    data: &ProjectData,
    id: ResourceId,
    field: ResourceField,
    value: FieldValue,
) -> Result<ProjectData> {
    let resource = data
        .resource(id)
        .cloned()
        .ok_or(SchedError::UnknownResource(id))?;
    Ok(data.with_resource(resource.set_value(field, value)?))
}

/// Applies an assignment field write, dispatching to its strategy.
pub(crate) fn set_assignment_field(
    data: &ProjectData,
    id: AssignmentId,
    field: AssignmentField,
    value: FieldValue,
) -> Result<ProjectData> {
    let assignment = data
        .assignment(id)
        .cloned()
        .ok_or(SchedError::UnknownAssignment(id))?;
    match field {
        AssignmentField::Units => {
            let units = match value {
                FieldValue::Percent(u) => u,
                other => return Err(type_mismatch(field.definition(), &other)),
            };
            if !units.is_finite() || units <= 0.0 {
                return Err(SchedError::InvalidUnits { value: units });
            }
            Ok(data.with_assignment(assignment.with_value(field, FieldValue::Percent(units))))
        }
        AssignmentField::Work => {
            let work = expect_duration(field.definition(), &value)?;
            let delta = work - assignment.work();
            let mut next = data.with_assignment(assignment.with_value(field, value));
            if let Some(task) = next.task(assignment.task()).cloned() {
                let total = task.work() + delta;
                next = next.with_task(task.with_value(TaskField::Work, FieldValue::Duration(total)));
            }
            Ok(next)
        }
        _ => Ok(data.with_assignment(assignment.set_value(field, value)?)),
    }
}

/// Resolves a task field for reading; the two derived text fields are
/// computed from structure, everything else comes off the record.
pub(crate) fn task_field_value(data: &ProjectData, task: &TaskData, field: TaskField) -> FieldValue {
    match field {
        TaskField::Predecessors => {
            let entries: Vec<PredecessorEntry> = task
                .predecessor_links()
                .iter()
                .map(|l| PredecessorEntry::new(ordinal_of(data, l.predecessor), l.link_type, l.lag))
                .collect();
            FieldValue::Text(PredecessorEntry::format_list(&entries))
        }
        TaskField::ResourceNames => FieldValue::Text(format_resource_names(data, task)),
        _ => task.get_value(field),
    }
}

// ================================
// Task strategies
// ================================

/// Stores the duration and re-levels the assignments that end with the
/// task: each gets `duration x units` of work, others keep theirs, and
/// task work becomes the new total.
fn set_duration(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let duration = expect_duration(TaskField::Duration.definition(), &value)?;
    let old_finish = task.finish();
    let mut next = data.with_task(task.with_value(TaskField::Duration, value));

    let assignments = data.assignments_for_task(task.id());
    if !assignments.is_empty() {
        for a in &assignments {
            if a.finish() == old_finish {
                let work = duration.scale(a.units());
                next = next
                    .with_assignment(a.with_value(AssignmentField::Work, FieldValue::Duration(work)));
            }
        }
        let total = assignment_total(&next, task.id());
        if let Some(record) = next.task(task.id()).cloned() {
            next = next.with_task(record.with_value(TaskField::Work, FieldValue::Duration(total)));
        }
    }
    Ok(next)
}

/// Stores task work and redistributes over assignments: zero zeroes
/// them all, otherwise each keeps its share of the old total, or an
/// even split when the old total was zero. With no assignments the raw
/// value is stored as-is.
fn set_task_work(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let work = expect_duration(TaskField::Work.definition(), &value)?;
    let mut next = data.with_task(task.with_value(TaskField::Work, value));

    let assignments = data.assignments_for_task(task.id());
    if !assignments.is_empty() {
        let old_total = assignment_total(data, task.id());
        for a in &assignments {
            let share = if work.is_zero() {
                Duration::zero()
            } else if old_total.is_zero() {
                work.scale(1.0 / assignments.len() as f64)
            } else {
                work.scale(a.work().as_minutes() as f64 / old_total.as_minutes() as f64)
            };
            next = next
                .with_assignment(a.with_value(AssignmentField::Work, FieldValue::Duration(share)));
        }
    }
    Ok(next)
}

/// `Start`/`Finish` writes translate to a no-earlier-than constraint
/// with the written date.
fn set_date_constraint(
    data: &ProjectData,
    task: &TaskData,
    field: TaskField,
    constraint: ConstraintType,
    value: FieldValue,
) -> Result<ProjectData> {
    match value {
        FieldValue::Date(Some(date)) => {
            let updated = task
                .with_value(TaskField::ConstraintType, FieldValue::Constraint(constraint))
                .with_value(TaskField::ConstraintDate, FieldValue::from(date));
            Ok(data.with_task(updated))
        }
        FieldValue::Date(None) => Err(SchedError::ConstraintDateRequired(constraint)),
        other => Err(type_mismatch(field.definition(), &other)),
    }
}

/// Stores the constraint type; switching to a date-free type clears the
/// date, switching to a date-requiring one without a date defaults it
/// to the task's current start or finish.
fn set_constraint_type(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let constraint = match value {
        FieldValue::Constraint(c) => c,
        other => return Err(type_mismatch(TaskField::ConstraintType.definition(), &other)),
    };
    let mut updated = task.with_value(TaskField::ConstraintType, FieldValue::Constraint(constraint));
    if constraint.requires_date() {
        if task.constraint_date().is_none() {
            let fallback = match constraint {
                ConstraintType::StartNoEarlierThan => task.start(),
                _ => task.finish(),
            }
            .unwrap_or_else(|| data.info().start());
            updated = updated.with_value(TaskField::ConstraintDate, FieldValue::from(fallback));
        }
    } else {
        updated = updated.without_value(TaskField::ConstraintDate);
    }
    Ok(data.with_task(updated))
}

fn set_constraint_date(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let constraint = task.constraint_type();
    match value {
        FieldValue::Date(Some(_)) => {
            if !constraint.requires_date() {
                return Err(SchedError::ConstraintDateNotAllowed(constraint));
            }
            Ok(data.with_task(task.with_value(TaskField::ConstraintDate, value)))
        }
        FieldValue::Date(None) => {
            if constraint.requires_date() {
                return Err(SchedError::ConstraintDateRequired(constraint));
            }
            Ok(data.with_task(task.without_value(TaskField::ConstraintDate)))
        }
        other => Err(type_mismatch(TaskField::ConstraintDate.definition(), &other)),
    }
}

fn set_ordinal(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let ordinal = match value {
        FieldValue::Integer(i) => usize::try_from(i).unwrap_or(usize::MAX),
        other => return Err(type_mismatch(TaskField::Ordinal.definition(), &other)),
    };
    data.move_task(task.id(), ordinal)
}

/// Applies predecessor list text: links absent from the text are
/// removed, new ones added, changed ones replaced. Any failure (bad
/// text, unknown ordinal, cycle) leaves the snapshot untouched.
fn set_predecessor_text(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let text = value
        .as_text()
        .ok_or_else(|| type_mismatch(TaskField::Predecessors.definition(), &value))?;
    let entries = PredecessorEntry::parse_list(text)?;

    let mut desired: Vec<TaskLink> = Vec::with_capacity(entries.len());
    for entry in &entries {
        let predecessor = data
            .task_by_ordinal(entry.ordinal)
            .ok_or(SchedError::OrdinalOutOfRange {
                ordinal: entry.ordinal,
                count: data.task_count(),
            })?;
        desired.push(TaskLink::new(
            predecessor.id(),
            task.id(),
            entry.link_type,
            entry.lag,
        ));
    }

    let mut next = data.clone();
    for link in task.predecessor_links().iter() {
        if !desired.iter().any(|d| d.predecessor == link.predecessor) {
            next = next.remove_task_link(link.predecessor, task.id())?;
        }
    }
    for link in desired {
        let current = next.task(task.id()).and_then(|t| {
            t.predecessor_links()
                .iter()
                .find(|l| l.predecessor == link.predecessor)
                .copied()
        });
        match current {
            Some(existing) if existing == link => {}
            Some(_) => {
                next = next.remove_task_link(link.predecessor, task.id())?;
                next = next.add_task_link(link)?;
            }
            None => next = next.add_task_link(link)?,
        }
    }
    Ok(next)
}

/// Applies resource list text: entries bind a resource (created by name
/// when unknown) at the bracketed units; assignments whose resource is
/// not mentioned are removed.
fn set_resource_names(data: &ProjectData, task: &TaskData, value: FieldValue) -> Result<ProjectData> {
    let text = value
        .as_text()
        .ok_or_else(|| type_mismatch(TaskField::ResourceNames.definition(), &value))?;
    let entries = parse_resource_list(text)?;

    let mut next = data.clone();
    let mut mentioned: Vec<AssignmentId> = Vec::with_capacity(entries.len());
    for (name, units) in entries {
        if !units.is_finite() || units <= 0.0 {
            return Err(SchedError::InvalidUnits { value: units });
        }
        let resource_id = match next.resource_by_name(&name) {
            Some(resource) => resource.id(),
            None => {
                let id = ResourceId::create();
                next = next.add_resource(id)?;
                if let Some(record) = next.resource(id).cloned() {
                    next = next
                        .with_resource(record.with_value(ResourceField::Name, name.clone().into()));
                }
                id
            }
        };
        let existing = next
            .assignments_for_task(task.id())
            .into_iter()
            .find(|a| a.resource() == resource_id);
        let assignment_id = match existing {
            Some(a) => a.id(),
            None => {
                let id = AssignmentId::create();
                next = super::ops::add_assignment(&next, id, task.id(), resource_id)?;
                id
            }
        };
        if let Some(record) = next.assignment(assignment_id).cloned() {
            next = next
                .with_assignment(record.with_value(AssignmentField::Units, FieldValue::Percent(units)));
        }
        mentioned.push(assignment_id);
    }
    for assignment in next.assignments_for_task(task.id()) {
        if !mentioned.contains(&assignment.id()) {
            next = super::ops::remove_assignment(&next, assignment.id())?;
        }
    }
    Ok(next)
}

// ================================
// Text helpers
// ================================

/// Parses `"Res1 [10%], Res2"` into name/units pairs; a missing
/// bracket means full units.
fn parse_resource_list(text: &str) -> Result<Vec<(String, f64)>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        let (name, units) = match part.split_once('[') {
            Some((name, rest)) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or_else(|| SchedError::parse("resource list", text))?;
                let units = FieldKind::Percent
                    .parse(inner.trim())?
                    .as_percent()
                    .ok_or_else(|| SchedError::parse("resource list", text))?;
                (name.trim(), units)
            }
            None => (part, 1.0),
        };
        if name.is_empty() {
            return Err(SchedError::parse("resource list", text));
        }
        entries.push((name.to_string(), units));
    }
    Ok(entries)
}

/// Formats a task's assignments as resource list text, ordered by
/// resource name; units print only when not 100%.
fn format_resource_names(data: &ProjectData, task: &TaskData) -> String {
    let mut parts: Vec<(String, f64)> = data
        .assignments_for_task(task.id())
        .iter()
        .map(|a| {
            let name = data
                .resource(a.resource())
                .map(|r| r.name())
                .unwrap_or_default();
            (name, a.units())
        })
        .collect();
    parts.sort_by(|a, b| a.0.cmp(&b.0));
    parts
        .iter()
        .map(|(name, units)| {
            if (*units - 1.0).abs() < f64::EPSILON {
                name.clone()
            } else {
                let pct = FieldKind::Percent.format(&FieldValue::Percent(*units));
                format!("{name} [{pct}]")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn assignment_total(data: &ProjectData, task: TaskId) -> Duration {
    data.assignments_for_task(task)
        .iter()
        .fold(Duration::zero(), |acc, a| acc + a.work())
}

fn ordinal_of(data: &ProjectData, id: TaskId) -> usize {
    data.task(id).map(|t| t.ordinal()).unwrap_or_default()
}

fn expect_duration<F: ProjectField>(
    def: &FieldDefinition<F>,
    value: &FieldValue,
) -> Result<Duration> {
    value.as_duration().ok_or_else(|| type_mismatch(def, value))
}

fn type_mismatch<F: ProjectField>(def: &FieldDefinition<F>, value: &FieldValue) -> SchedError {
    SchedError::TypeMismatch {
        field: def.name,
        expected: def.kind,
        actual: value.kind(),
    }
}
