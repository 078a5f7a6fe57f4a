//! Property tests for scheduling, link admission, calendar arithmetic,
//! and text round-trips.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use cpm_core::models::{
    Calendar, Duration, DurationUnit, LinkType, PredecessorEntry, TaskId,
};
use cpm_core::{scheduler, Project};

fn base_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// A random acyclic project: task `i` may only depend on tasks `0..i`,
/// so every generated link set is a DAG by construction.
fn dag_project_strategy(max_tasks: usize) -> impl Strategy<Value = Project> {
    (1..=max_tasks).prop_flat_map(|n| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..n),
            n,
        );
        let durations = proptest::collection::vec(1..15i64, n);
        (deps, durations).prop_map(|(raw_deps, durations)| {
            let mut project = Project::empty();
            let mut ids: Vec<TaskId> = Vec::new();
            for (i, days) in durations.iter().enumerate() {
                let task = project
                    .add_task()
                    .unwrap()
                    .set_duration(Duration::days(*days))
                    .unwrap();
                ids.push(task.id());
                project = task.project().clone();

                let mut picked = HashSet::new();
                for raw in &raw_deps[i] {
                    if i > 0 {
                        picked.insert(raw % i);
                    }
                }
                for dep in picked {
                    project = project.link_tasks(ids[dep], ids[i]).unwrap();
                }
            }
            project
        })
    })
}

proptest! {
    #[test]
    fn prop_scheduling_reaches_a_fixpoint(project in dag_project_strategy(6)) {
        let data = project.data();
        prop_assert_eq!(&scheduler::schedule(data), data);
    }

    #[test]
    fn prop_windows_are_ordered(project in dag_project_strategy(6)) {
        let work_start = Calendar::standard().find_work_start(project.start());
        for task in project.tasks() {
            let start = task.start().unwrap();
            let finish = task.finish().unwrap();
            prop_assert!(start >= work_start);
            prop_assert!(finish >= start);
            prop_assert!(task.total_slack() >= Duration::zero());

            // Predecessors always finish before their successors start.
            let record = project.data().task(task.id()).unwrap();
            for link in record.predecessor_links().iter() {
                let pred = project.task(link.predecessor).unwrap();
                prop_assert!(pred.finish().unwrap() <= start);
            }
        }
    }

    #[test]
    fn prop_back_edges_are_rejected_unchanged(
        n in 2..7usize,
        pick in any::<(usize, usize)>(),
    ) {
        // A straight chain 0 -> 1 -> ... -> n-1.
        let mut project = Project::empty();
        let mut ids = Vec::new();
        for i in 0..n {
            let task = project.add_task().unwrap();
            ids.push(task.id());
            project = task.project().clone();
            if i > 0 {
                project = project.link_tasks(ids[i - 1], ids[i]).unwrap();
            }
        }

        // Any edge pointing back to an ancestor closes a cycle.
        let k = 1 + pick.0 % (n - 1);
        let j = pick.1 % k;
        prop_assert!(project.link_tasks(ids[k], ids[j]).is_err());
        prop_assert!(project.get_changes(&project).is_empty());
        prop_assert_eq!(
            &scheduler::schedule(project.data()),
            project.data()
        );
    }

    #[test]
    fn prop_diff_is_symmetric_for_adds(extra in 1..5usize) {
        let base = Project::empty();
        let mut grown = base.clone();
        let mut added = Vec::new();
        for _ in 0..extra {
            let task = grown.add_task().unwrap();
            added.push(task.id());
            grown = task.project().clone();
        }
        added.sort();

        let forward = grown.get_changes(&base);
        prop_assert_eq!(&forward.tasks.added, &added);
        prop_assert!(forward.tasks.removed.is_empty());

        let backward = base.get_changes(&grown);
        prop_assert_eq!(&backward.tasks.removed, &added);
        prop_assert!(backward.tasks.added.is_empty());
    }

    #[test]
    fn prop_added_work_is_measured_back(
        offset in 0..525_600i64,
        minutes in 1..4_800i64,
    ) {
        let calendar = Calendar::standard();
        let t = base_date() + chrono::Duration::minutes(offset);
        let work = Duration::from_minutes(minutes);

        let start = calendar.find_work_start(t);
        let end = calendar.add_work(t, work);
        prop_assert_eq!(calendar.get_work(start, end), work);
        prop_assert_eq!(calendar.get_work(end, start), -work);
        prop_assert_eq!(calendar.subtract_work(end, work), start);
    }

    #[test]
    fn prop_measured_work_lands_on_the_snapped_end(
        offset in 0..525_600i64,
        gap in 1..20_160i64,
    ) {
        let calendar = Calendar::standard();
        let a = base_date() + chrono::Duration::minutes(offset);
        let b = a + chrono::Duration::minutes(gap);

        let work = calendar.get_work(a, b);
        prop_assume!(!work.is_zero());
        prop_assert_eq!(calendar.add_work(a, work), calendar.find_work_end(b));
    }

    #[test]
    fn prop_predecessor_list_text_round_trips(
        raw in proptest::collection::btree_map(
            0..50usize,
            (0..4usize, -5..5i64),
            0..6,
        ),
    ) {
        let types = [
            LinkType::FinishToStart,
            LinkType::StartToStart,
            LinkType::FinishToFinish,
            LinkType::StartToFinish,
        ];
        let entries: Vec<PredecessorEntry> = raw
            .into_iter()
            .map(|(ordinal, (ty, lag))| {
                PredecessorEntry::new(ordinal, types[ty], Duration::days(lag))
            })
            .collect();

        let text = PredecessorEntry::format_list(&entries);
        prop_assert_eq!(PredecessorEntry::parse_list(&text).unwrap(), entries);
    }

    #[test]
    fn prop_duration_day_text_round_trips(days in 0..1_000i64) {
        let duration = Duration::days(days);
        let parsed = Duration::parse(&duration.format_days(), DurationUnit::Days).unwrap();
        prop_assert_eq!(parsed, duration);
    }
}
