//! Entity operations that keep task work consistent.
//!
//! Task work always equals the sum of its assignments' work once it has
//! any assignment, so creating and removing assignments carries
//! bookkeeping beyond the structural edit:
//!
//! - the first assignment takes over the task's work (or its duration's
//!   worth when work is zero);
//! - later assignments scale the total so existing assignments keep
//!   their hours and the newcomer receives the evenly-scaled remainder;
//! - removal subtracts exactly the removed assignment's work.

use log::trace;

use crate::error::{Result, SchedError};
use crate::models::{
    AssignmentField, AssignmentId, Duration, FieldValue, ProjectData, ResourceId, TaskField,
    TaskId,
};

/// Creates an assignment and seeds its work.
pub(crate) fn add_assignment(
    data: &ProjectData,
    id: AssignmentId,
    task_id: TaskId,
    resource_id: ResourceId,
) -> Result<ProjectData> {
    let task = data
        .task(task_id)
        .cloned()
        .ok_or(SchedError::UnknownTask(task_id))?;
    let existing = data.assignments_for_task(task_id);
    let mut next = data.add_assignment(id, task_id, resource_id)?;

    let (seed, total) = if existing.is_empty() {
        let seed = if task.work().is_zero() {
            task.duration()
        } else {
            task.work()
        };
        (seed, seed)
    } else {
        let count = existing.len();
        let old_total = task.work();
        let new_total = old_total.scale((count as f64 + 1.0) / count as f64);
        (new_total - old_total, new_total)
    };
    trace!("assignment {id} seeded with {}", seed.format_hours());

    if let Some(assignment) = next.assignment(id).cloned() {
        next = next
            .with_assignment(assignment.with_value(AssignmentField::Work, FieldValue::Duration(seed)));
    }
    next = next.with_task(task.with_value(TaskField::Work, FieldValue::Duration(total)));
    Ok(next)
}

/// Removes an assignment, subtracting its work from the task total.
pub(crate) fn remove_assignment(data: &ProjectData, id: AssignmentId) -> Result<ProjectData> {
    let assignment = data
        .assignment(id)
        .cloned()
        .ok_or(SchedError::UnknownAssignment(id))?;
    let mut next = data.remove_assignment(id)?;
    if let Some(task) = next.task(assignment.task()).cloned() {
        let total = task.work() - assignment.work();
        next = next.with_task(task.with_value(TaskField::Work, FieldValue::Duration(total)));
    }
    Ok(next)
}

/// Removes a resource; every assignment it held is removed with the
/// usual work bookkeeping first.
pub(crate) fn remove_resource(data: &ProjectData, id: ResourceId) -> Result<ProjectData> {
    if data.resource(id).is_none() {
        return Err(SchedError::UnknownResource(id));
    }
    let mut next = data.clone();
    for assignment in data.assignments_for_resource(id) {
        next = remove_assignment(&next, assignment.id())?;
    }
    next.remove_resource(id)
}
