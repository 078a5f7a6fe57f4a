//! The critical-path scheduler.
//!
//! # Algorithm
//!
//! 1. **Early pass** (predecessor → successor, ties broken by ordinal):
//!    a task's early start is the latest of the project start and its
//!    predecessors' early finishes, snapped to working time; its early
//!    finish adds the calendar-worked span. The span comes from the
//!    task's assignments (each contributes `work / units` of working
//!    time) when any assignment carries work, otherwise from the stored
//!    duration. Start-no-earlier-than raises the start; a
//!    finish-no-earlier-than date delays the whole task so it finishes
//!    at the constraint.
//! 2. **Late pass** (reverse order): late finish is the earliest
//!    successor late start, or the task's *own* early finish when it
//!    has no successors; every chain is measured against its own end,
//!    not a single project end.
//! 3. **Derived fields**: start/finish, the early/late window, slack,
//!    the critical flag, duration re-derived from the scheduled window,
//!    and per-assignment start/finish.
//!
//! The pass never fails: every inconsistency it would have to reject is
//! prevented earlier, during structural mutation.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::debug;

use crate::models::{
    AssignmentField, Calendar, ConstraintType, Duration, FieldValue, ProjectData, TaskData,
    TaskField, TaskId,
};

/// One task's scheduled window.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: NaiveDateTime,
    finish: NaiveDateTime,
    late_start: NaiveDateTime,
    late_finish: NaiveDateTime,
    /// Working time between start and finish.
    work: Duration,
}

/// Schedules a snapshot, returning a new one with every computed field
/// in place. Running it on its own output is a fixpoint; records whose
/// fields come out unchanged are shared with the input.
pub fn schedule(data: &ProjectData) -> ProjectData {
    let calendar = data.info().calendar();
    let order = topological_order(data);
    let mut windows: BTreeMap<TaskId, Window> = BTreeMap::new();

    // Early pass.
    for id in &order {
        let Some(task) = data.task(*id) else { continue };
        let window = early_window(data, &calendar, task, &windows);
        windows.insert(*id, window);
    }

    // Late pass.
    for id in order.iter().rev() {
        let Some(task) = data.task(*id) else { continue };
        let late_finish = task
            .successor_links()
            .iter()
            .filter_map(|l| windows.get(&l.successor).map(|w| w.late_start))
            .min()
            .unwrap_or_else(|| windows[id].finish);
        let late_start = calendar.subtract_work(late_finish, windows[id].work);
        if let Some(w) = windows.get_mut(id) {
            w.late_start = late_start;
            w.late_finish = late_finish;
        }
    }

    let next = write_windows(data, &calendar, &windows);
    debug!(
        "scheduled {} tasks, {} assignments",
        next.task_count(),
        next.assignments().count()
    );
    next
}

/// Kahn's algorithm over predecessor counts; the ready set is drained
/// lowest ordinal first so the order is deterministic.
fn topological_order(data: &ProjectData) -> Vec<TaskId> {
    let mut indegree: BTreeMap<TaskId, usize> = data
        .tasks()
        .map(|t| (t.id(), t.predecessor_links().len()))
        .collect();
    let mut ready: BTreeMap<usize, TaskId> = data
        .tasks()
        .filter(|t| t.predecessor_links().is_empty())
        .map(|t| (t.ordinal(), t.id()))
        .collect();

    let mut order = Vec::with_capacity(indegree.len());
    while let Some((_, id)) = ready.pop_first() {
        order.push(id);
        let Some(task) = data.task(id) else { continue };
        for link in task.successor_links().iter() {
            if let Some(remaining) = indegree.get_mut(&link.successor) {
                *remaining -= 1;
                if *remaining == 0 {
                    let ordinal = data.task(link.successor).map(|t| t.ordinal()).unwrap_or(0);
                    ready.insert(ordinal, link.successor);
                }
            }
        }
    }
    if order.len() < data.task_count() {
        // Unreachable while the acyclicity invariant holds.
        debug!("dependency order incomplete, appending leftovers");
        let mut rest: Vec<_> = data
            .tasks()
            .filter(|t| !order.contains(&t.id()))
            .cloned()
            .collect();
        rest.sort_by_key(|t| t.ordinal());
        order.extend(rest.iter().map(|t| t.id()));
    }
    order
}

fn early_window(
    data: &ProjectData,
    calendar: &Calendar,
    task: &TaskData,
    windows: &BTreeMap<TaskId, Window>,
) -> Window {
    let mut candidate = data.info().start();
    for link in task.predecessor_links().iter() {
        if let Some(w) = windows.get(&link.predecessor) {
            candidate = candidate.max(w.finish);
        }
    }
    if task.constraint_type() == ConstraintType::StartNoEarlierThan {
        if let Some(date) = task.constraint_date() {
            candidate = candidate.max(date);
        }
    }
    let mut start = calendar.find_work_start(candidate);
    let mut finish = finish_from(data, calendar, task, start);

    if task.constraint_type() == ConstraintType::FinishNoEarlierThan {
        if let Some(date) = task.constraint_date() {
            let target = calendar.find_work_end(date);
            if target > finish {
                let span = calendar.get_work(start, finish);
                finish = target;
                start = calendar.subtract_work(finish, span);
            }
        }
    }
    Window {
        start,
        finish,
        late_start: start,
        late_finish: finish,
        work: calendar.get_work(start, finish),
    }
}

/// The early finish for a task starting at `start`: the latest
/// assignment finish when any assignment carries work, else the stored
/// duration applied in working time.
fn finish_from(
    data: &ProjectData,
    calendar: &Calendar,
    task: &TaskData,
    start: NaiveDateTime,
) -> NaiveDateTime {
    let assignments = data.assignments_for_task(task.id());
    let carries_work = assignments.iter().any(|a| !a.work().is_zero());
    if carries_work {
        assignments
            .iter()
            .map(|a| calendar.add_work(start, assignment_span(a.work(), a.units())))
            .max()
            .unwrap_or(start)
    } else {
        calendar.add_work(start, task.duration())
    }
}

/// Working time an assignment occupies: work divided by units.
fn assignment_span(work: Duration, units: f64) -> Duration {
    let units = if units > 0.0 { units } else { 1.0 };
    work.scale(1.0 / units)
}

/// Writes every computed field back, sharing records whose fields are
/// unchanged.
fn write_windows(
    data: &ProjectData,
    calendar: &Calendar,
    windows: &BTreeMap<TaskId, Window>,
) -> ProjectData {
    let mut next = data.clone();
    for task in data.tasks() {
        let Some(w) = windows.get(&task.id()) else { continue };
        let start_slack = calendar.get_work(w.start, w.late_start);
        let finish_slack = calendar.get_work(w.finish, w.late_finish);
        let total_slack = start_slack.min(finish_slack);
        let duration = w.work.with_estimated(task.duration().is_estimated());

        let updated = task
            .with_value(TaskField::Start, FieldValue::from(w.start))
            .with_value(TaskField::Finish, FieldValue::from(w.finish))
            .with_value(TaskField::EarlyStart, FieldValue::from(w.start))
            .with_value(TaskField::EarlyFinish, FieldValue::from(w.finish))
            .with_value(TaskField::LateStart, FieldValue::from(w.late_start))
            .with_value(TaskField::LateFinish, FieldValue::from(w.late_finish))
            .with_value(TaskField::StartSlack, FieldValue::Duration(start_slack))
            .with_value(TaskField::FinishSlack, FieldValue::Duration(finish_slack))
            .with_value(TaskField::TotalSlack, FieldValue::Duration(total_slack))
            .with_value(TaskField::Critical, FieldValue::Bool(total_slack.is_zero()))
            .with_value(TaskField::Duration, FieldValue::Duration(duration));
        if !updated.shares_fields(task) {
            next = next.with_task(updated);
        }
    }
    for assignment in data.assignments() {
        let Some(w) = windows.get(&assignment.task()) else { continue };
        let finish = calendar.add_work(
            w.start,
            assignment_span(assignment.work(), assignment.units()),
        );
        let updated = assignment
            .with_value(AssignmentField::Start, FieldValue::from(w.start))
            .with_value(AssignmentField::Finish, FieldValue::from(finish));
        if !updated.shares_fields(assignment) {
            next = next.with_assignment(updated);
        }
    }
    next
}
