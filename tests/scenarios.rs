//! End-to-end editing and scheduling flows through the project facade.

use chrono::{NaiveDate, NaiveDateTime};

use cpm_core::models::{Duration, LinkType};
use cpm_core::{Project, SchedError};

fn date(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// A project starting Monday 2018-01-29 on the standard calendar.
fn project_2018() -> Project {
    Project::empty().set_start(date(2018, 1, 29, 0))
}

#[test]
fn test_ten_day_task_skips_the_weekend() {
    let task = project_2018()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(10))
        .unwrap();

    assert_eq!(task.start(), Some(date(2018, 1, 29, 8)));
    assert_eq!(task.finish(), Some(date(2018, 2, 9, 17)));
    assert!(task.is_critical());
}

#[test]
fn test_successor_follows_its_predecessor() {
    let first = project_2018()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(10))
        .unwrap();
    let second = first
        .project()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(5))
        .unwrap();
    let project = second
        .project()
        .link_tasks(first.id(), second.id())
        .unwrap();

    let second = project.task(second.id()).unwrap();
    assert_eq!(second.start(), Some(date(2018, 2, 12, 8)));
    assert_eq!(second.finish(), Some(date(2018, 2, 16, 17)));
}

#[test]
fn test_longer_duration_relevels_the_ending_assignment() {
    let project = Project::empty().set_start(date(2018, 2, 5, 0));
    let task = project.add_task().unwrap();
    let alice = task.project().add_resource().unwrap();
    let bob = alice.project().add_resource().unwrap();

    let first = bob
        .project()
        .add_assignment(task.id(), alice.id())
        .unwrap()
        .set_work(Duration::hours(40))
        .unwrap();
    let second = first
        .project()
        .add_assignment(task.id(), bob.id())
        .unwrap()
        .set_work(Duration::hours(80))
        .unwrap();

    // The 80h assignment carries the finish to 2018-02-16 17:00.
    let task = second.project().task(task.id()).unwrap();
    assert_eq!(task.finish(), Some(date(2018, 2, 16, 17)));

    // Stretching the duration re-levels only the assignment that ends
    // with the task; the 40h one already finished early and is kept.
    let task = task.set_duration(Duration::days(12)).unwrap();
    let project = task.project();
    let first = project.assignment(first.id()).unwrap();
    let second = project.assignment(second.id()).unwrap();

    assert_eq!(first.work(), Duration::hours(40));
    assert_eq!(second.work(), Duration::hours(96));
    assert_eq!(task.work(), Duration::hours(136));
    assert_eq!(first.finish(), Some(date(2018, 2, 9, 17)));
    assert_eq!(second.finish(), Some(date(2018, 2, 20, 17)));
    assert_eq!(task.finish(), Some(date(2018, 2, 20, 17)));
    assert_eq!(task.duration(), Duration::days(12));
}

#[test]
fn test_removing_a_resource_clears_work_but_not_dates() {
    let project = Project::empty().set_start(date(2018, 2, 5, 0));
    let task = project
        .add_task()
        .unwrap()
        .set_duration(Duration::days(5))
        .unwrap();
    let resource = task.project().add_resource().unwrap();
    let assigned = resource
        .project()
        .add_assignment(task.id(), resource.id())
        .unwrap()
        .project()
        .clone();

    let before = assigned.task(task.id()).unwrap();
    assert_eq!(before.work(), Duration::hours(40));

    let after = assigned.remove_resource(resource.id()).unwrap();
    let task = after.task(task.id()).unwrap();
    assert!(task.work().is_zero());
    assert_eq!(task.duration(), Duration::days(5));
    assert_eq!(task.start(), Some(date(2018, 2, 5, 8)));
    assert_eq!(task.finish(), Some(date(2018, 2, 9, 17)));
    assert!(after.assignments().is_empty());

    // The diff picks up both the dropped assignment and the work delta.
    let changes = after.get_changes(&assigned);
    assert_eq!(changes.assignments.removed.len(), 1);
    assert_eq!(changes.resources.removed.len(), 1);
    let task_changes = &changes.tasks.changed[0];
    assert!(task_changes
        .fields
        .iter()
        .any(|c| c.old == Duration::hours(40).into() && c.new == Duration::zero().into()));
}

#[test]
fn test_predecessor_text_round_trips_with_lag() {
    let first = project_2018().add_task().unwrap();
    let second = first.project().add_task().unwrap();

    let second = second.set_predecessors("0FS+1 day").unwrap();
    assert_eq!(second.predecessors(), "0FS+1 day");

    let record = second.project().data().task(second.id()).unwrap();
    let links = record.predecessor_links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].predecessor, first.id());
    assert_eq!(links[0].link_type, LinkType::FinishToStart);
    assert_eq!(links[0].lag, Duration::days(1));
}

#[test]
fn test_resource_name_text_builds_assignments() {
    let task = project_2018()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(5))
        .unwrap();
    let task = task.set_resource_names("Alice [50%], Bob").unwrap();

    let project = task.project();
    assert_eq!(project.resources().len(), 2);
    assert_eq!(project.assignments().len(), 2);
    assert_eq!(task.resource_names(), "Alice [50%], Bob");

    // Dropping Alice from the text removes her assignment but keeps the
    // resource itself around.
    let task = task.set_resource_names("Bob").unwrap();
    assert_eq!(task.project().resources().len(), 2);
    assert_eq!(task.project().assignments().len(), 1);
    assert_eq!(task.resource_names(), "Bob");
}

#[test]
fn test_start_edit_becomes_a_constraint() {
    let task = project_2018()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(5))
        .unwrap();
    assert_eq!(task.start(), Some(date(2018, 1, 29, 8)));

    let task = task.set_start(date(2018, 2, 7, 0)).unwrap();
    assert_eq!(task.start(), Some(date(2018, 2, 7, 8)));
    assert_eq!(task.finish(), Some(date(2018, 2, 13, 17)));
}

#[test]
fn test_cycles_are_rejected_before_any_change() {
    let first = project_2018().add_task().unwrap();
    let second = first.project().add_task().unwrap();
    let project = second
        .project()
        .link_tasks(first.id(), second.id())
        .unwrap();

    let err = project.link_tasks(second.id(), first.id()).unwrap_err();
    assert!(matches!(err, SchedError::LinkCycle { .. }));

    // The rejected edit left no trace.
    let second = project.task(second.id()).unwrap();
    assert_eq!(second.predecessors(), "0");
    assert!(project
        .data()
        .task(first.id())
        .unwrap()
        .predecessor_links()
        .is_empty());
}

#[test]
fn test_old_snapshots_survive_later_edits() {
    let v0 = project_2018();
    let task = v0.add_task().unwrap();
    let v1 = task.project().clone();
    let v2 = task
        .set_duration(Duration::days(3))
        .unwrap()
        .set_name("Paint")
        .unwrap()
        .project()
        .clone();

    // v0 and v1 still answer queries exactly as when they were made.
    assert!(v0.tasks().is_empty());
    assert_eq!(v1.task(task.id()).unwrap().duration(), Duration::zero());

    let changes = v2.get_changes(&v0);
    assert_eq!(changes.tasks.added, vec![task.id()]);
    assert!(changes.tasks.changed.is_empty());
}

#[test]
fn test_scheduled_snapshot_round_trips_through_json() {
    let first = project_2018()
        .add_task()
        .unwrap()
        .set_name("Design")
        .unwrap()
        .set_duration(Duration::days(10))
        .unwrap();
    let second = first
        .project()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(5))
        .unwrap();
    let task = second
        .project()
        .link_tasks(first.id(), second.id())
        .unwrap()
        .task(second.id())
        .unwrap()
        .set_resource_names("Alice [50%]")
        .unwrap();

    let data = task.project().data();
    let json = serde_json::to_string(data).unwrap();
    let restored: cpm_core::models::ProjectData = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, data);
}

#[test]
fn test_rescheduling_a_scheduled_project_changes_nothing() {
    let task = project_2018()
        .add_task()
        .unwrap()
        .set_duration(Duration::days(4))
        .unwrap();
    let task = task.set_resource_names("Alice").unwrap();

    let data = task.project().data();
    let again = cpm_core::scheduler::schedule(data);
    assert_eq!(&again, data);
    assert!(task.project().get_changes(task.project()).is_empty());
}
