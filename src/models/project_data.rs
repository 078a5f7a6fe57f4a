//! The persistent project snapshot and its structural operations.
//!
//! [`ProjectData`] is the aggregate: three ID-keyed maps of
//! [`Arc`]-shared records plus [`ProjectInfo`] (name, start date, and
//! the calendar set). Every operation returns a *new* aggregate sharing
//! every untouched record; no snapshot mutates after construction.
//!
//! Structural invariants, re-established by every operation here:
//! 1. Task ordinals are a dense permutation of `[0, task_count)`.
//! 2. The link graph is acyclic; candidate links are checked *before*
//!    the graph is touched.
//! 3. Assignment task/resource references resolve; removing either
//!    endpoint removes the assignment.
//! 4. Both link lists of every task are ordered by the other endpoint's
//!    ordinal.
//! 5. The current calendar is a member of the calendar set.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::calendar::Calendar;
use super::data::{AssignmentData, ResourceData, TaskData};
use super::fields::{FieldValue, TaskField};
use super::ident::{AssignmentId, ProjectId, ResourceId, TaskId};
use super::link::TaskLink;
use crate::error::{Result, SchedError};

// ================================
// Project info
// ================================

/// Project-level settings: identity, name, start date, and the calendar
/// set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Nil until the facade mints one.
    id: ProjectId,
    name: String,
    /// Scheduling origin; tasks with no predecessors start here.
    start: NaiveDateTime,
    calendar_name: String,
    calendars: BTreeMap<String, Arc<Calendar>>,
}

impl ProjectInfo {
    pub fn new() -> Self {
        let standard = Calendar::standard();
        let mut calendars = BTreeMap::new();
        calendars.insert(standard.name().to_string(), Arc::new(standard));
        Self {
            id: ProjectId::nil(),
            name: String::new(),
            // A Monday, so an empty project schedules deterministically.
            start: NaiveDate::from_ymd_opt(2000, 1, 3)
                .unwrap_or_default()
                .and_time(NaiveTime::MIN),
            calendar_name: "Standard".to_string(),
            calendars,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn calendar_name(&self) -> &str {
        &self.calendar_name
    }

    /// The current calendar.
    pub fn calendar(&self) -> Arc<Calendar> {
        self.calendars
            .get(&self.calendar_name)
            .cloned()
            .unwrap_or_else(|| Arc::new(Calendar::standard()))
    }

    /// Calendar names in the set, ordered.
    pub fn calendar_names(&self) -> impl Iterator<Item = &str> {
        self.calendars.keys().map(|k| k.as_str())
    }

    pub fn with_id(&self, id: ProjectId) -> Self {
        Self { id, ..self.clone() }
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_start(&self, start: NaiveDateTime) -> Self {
        Self {
            start,
            ..self.clone()
        }
    }

    /// Switches the current calendar to a member of the set.
    pub fn with_calendar(&self, name: &str) -> Result<Self> {
        if !self.calendars.contains_key(name) {
            return Err(SchedError::UnknownCalendar(name.to_string()));
        }
        Ok(Self {
            calendar_name: name.to_string(),
            ..self.clone()
        })
    }

    /// Adds a calendar to the set, replacing any same-named entry.
    pub fn with_added_calendar(&self, calendar: Calendar) -> Self {
        let mut calendars = self.calendars.clone();
        calendars.insert(calendar.name().to_string(), Arc::new(calendar));
        Self {
            calendars,
            ..self.clone()
        }
    }

    /// Removes a calendar; the current calendar cannot be removed.
    pub fn with_removed_calendar(&self, name: &str) -> Result<Self> {
        if name == self.calendar_name {
            return Err(SchedError::RemoveCurrentCalendar(name.to_string()));
        }
        if !self.calendars.contains_key(name) {
            return Err(SchedError::UnknownCalendar(name.to_string()));
        }
        let mut calendars = self.calendars.clone();
        calendars.remove(name);
        Ok(Self {
            calendars,
            ..self.clone()
        })
    }
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self::new()
    }
}

// ================================
// Project data
// ================================

/// One immutable project snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    info: ProjectInfo,
    tasks: BTreeMap<TaskId, Arc<TaskData>>,
    resources: BTreeMap<ResourceId, Arc<ResourceData>>,
    assignments: BTreeMap<AssignmentId, Arc<AssignmentData>>,
}

impl ProjectData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    pub fn with_info(&self, info: ProjectInfo) -> Self {
        Self {
            info,
            ..self.clone()
        }
    }

    // --- lookup ---

    pub fn task(&self, id: TaskId) -> Option<&Arc<TaskData>> {
        self.tasks.get(&id)
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Arc<ResourceData>> {
        self.resources.get(&id)
    }

    pub fn assignment(&self, id: AssignmentId) -> Option<&Arc<AssignmentData>> {
        self.assignments.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Arc<TaskData>> {
        self.tasks.values()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Arc<ResourceData>> {
        self.resources.values()
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Arc<AssignmentData>> {
        self.assignments.values()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks ordered by ordinal.
    pub fn tasks_by_ordinal(&self) -> Vec<Arc<TaskData>> {
        let mut tasks: Vec<_> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.ordinal());
        tasks
    }

    pub fn task_by_ordinal(&self, ordinal: usize) -> Option<&Arc<TaskData>> {
        self.tasks.values().find(|t| t.ordinal() == ordinal)
    }

    pub fn assignments_for_task(&self, task: TaskId) -> Vec<Arc<AssignmentData>> {
        self.assignments
            .values()
            .filter(|a| a.task() == task)
            .cloned()
            .collect()
    }

    pub fn assignments_for_resource(&self, resource: ResourceId) -> Vec<Arc<AssignmentData>> {
        self.assignments
            .values()
            .filter(|a| a.resource() == resource)
            .cloned()
            .collect()
    }

    pub fn resource_by_name(&self, name: &str) -> Option<&Arc<ResourceData>> {
        self.resources.values().find(|r| r.name() == name)
    }

    fn ordinal_of(&self, id: TaskId) -> usize {
        self.task(id).map(|t| t.ordinal()).unwrap_or_default()
    }

    // --- record replacement (internal) ---

    pub(crate) fn with_task(&self, task: TaskData) -> Self {
        let mut tasks = self.tasks.clone();
        tasks.insert(task.id(), Arc::new(task));
        Self {
            tasks,
            ..self.clone()
        }
    }

    pub(crate) fn with_resource(&self, resource: ResourceData) -> Self {
        let mut resources = self.resources.clone();
        resources.insert(resource.id(), Arc::new(resource));
        Self {
            resources,
            ..self.clone()
        }
    }

    pub(crate) fn with_assignment(&self, assignment: AssignmentData) -> Self {
        let mut assignments = self.assignments.clone();
        assignments.insert(assignment.id(), Arc::new(assignment));
        Self {
            assignments,
            ..self.clone()
        }
    }

    // --- structural operations ---

    /// Appends a task at the last ordinal.
    pub fn add_task(&self, id: TaskId) -> Result<Self> {
        if self.tasks.contains_key(&id) {
            return Err(SchedError::DuplicateTask(id));
        }
        trace!("add task {id} at ordinal {}", self.tasks.len());
        let task = TaskData::new(id)
            .with_value(TaskField::Ordinal, FieldValue::Integer(self.tasks.len() as i64));
        Ok(self.with_task(task))
    }

    /// Removes a task, its assignments, and every link touching it,
    /// then renumbers the remaining ordinals dense.
    pub fn remove_task(&self, id: TaskId) -> Result<Self> {
        if !self.tasks.contains_key(&id) {
            return Err(SchedError::UnknownTask(id));
        }
        trace!("remove task {id}");
        let mut next = self.clone();
        next.tasks.remove(&id);
        next.assignments.retain(|_, a| a.task() != id);
        for (task_id, task) in next.tasks.clone() {
            let stripped = strip_links(&task, id);
            next.tasks.insert(task_id, stripped);
        }
        next.renumber();
        next.resort_links();
        Ok(next)
    }

    /// Moves a task to a new ordinal, shifting the others.
    pub fn move_task(&self, id: TaskId, ordinal: usize) -> Result<Self> {
        if !self.tasks.contains_key(&id) {
            return Err(SchedError::UnknownTask(id));
        }
        if ordinal >= self.tasks.len() {
            return Err(SchedError::OrdinalOutOfRange {
                ordinal,
                count: self.tasks.len(),
            });
        }
        trace!("move task {id} to ordinal {ordinal}");
        let mut order = self.tasks_by_ordinal();
        if let Some(pos) = order.iter().position(|t| t.id() == id) {
            let task = order.remove(pos);
            order.insert(ordinal, task);
        }
        let mut next = self.clone();
        for (i, task) in order.iter().enumerate() {
            next.tasks.insert(
                task.id(),
                Arc::new(task.with_value(TaskField::Ordinal, FieldValue::Integer(i as i64))),
            );
        }
        next.resort_links();
        Ok(next)
    }

    pub fn add_resource(&self, id: ResourceId) -> Result<Self> {
        if self.resources.contains_key(&id) {
            return Err(SchedError::DuplicateResource(id));
        }
        trace!("add resource {id}");
        Ok(self.with_resource(ResourceData::new(id)))
    }

    /// Removes a resource and all assignments referencing it.
    pub fn remove_resource(&self, id: ResourceId) -> Result<Self> {
        if !self.resources.contains_key(&id) {
            return Err(SchedError::UnknownResource(id));
        }
        trace!("remove resource {id}");
        let mut next = self.clone();
        next.resources.remove(&id);
        next.assignments.retain(|_, a| a.resource() != id);
        Ok(next)
    }

    /// Creates an assignment pairing an existing task and resource.
    pub fn add_assignment(
        &self,
        id: AssignmentId,
        task: TaskId,
        resource: ResourceId,
    ) -> Result<Self> {
        if self.assignments.contains_key(&id) {
            return Err(SchedError::DuplicateAssignment(id));
        }
        if !self.tasks.contains_key(&task) {
            return Err(SchedError::UnknownTask(task));
        }
        if !self.resources.contains_key(&resource) {
            return Err(SchedError::UnknownResource(resource));
        }
        trace!("add assignment {id} ({task} x {resource})");
        Ok(self.with_assignment(AssignmentData::new(id, task, resource)))
    }

    pub fn remove_assignment(&self, id: AssignmentId) -> Result<Self> {
        if !self.assignments.contains_key(&id) {
            return Err(SchedError::UnknownAssignment(id));
        }
        trace!("remove assignment {id}");
        let mut next = self.clone();
        next.assignments.remove(&id);
        Ok(next)
    }

    // --- dependency graph ---

    /// Admits a precedence link after duplicate and cycle checks; the
    /// graph is untouched when either check fails.
    pub fn add_task_link(&self, link: TaskLink) -> Result<Self> {
        let pred = link.predecessor;
        let succ = link.successor;
        if !self.tasks.contains_key(&pred) {
            return Err(SchedError::UnknownTask(pred));
        }
        if !self.tasks.contains_key(&succ) {
            return Err(SchedError::UnknownTask(succ));
        }
        let ordinals = (self.ordinal_of(pred), self.ordinal_of(succ));
        if self.has_link(pred, succ) {
            return Err(SchedError::DuplicateLink {
                predecessor: ordinals.0,
                successor: ordinals.1,
            });
        }
        if pred == succ || self.reaches_by_predecessors(pred, succ) {
            debug!(
                "rejected link {} -> {}: would create a cycle",
                ordinals.0, ordinals.1
            );
            return Err(SchedError::LinkCycle {
                predecessor: ordinals.0,
                successor: ordinals.1,
            });
        }
        trace!("add link {} -> {}", ordinals.0, ordinals.1);

        let mut next = self.clone();
        next.update_link_lists(succ, |links| {
            insert_sorted(links, link, |l| self.ordinal_of(l.predecessor))
        }, TaskField::PredecessorLinks);
        next.update_link_lists(pred, |links| {
            insert_sorted(links, link, |l| self.ordinal_of(l.successor))
        }, TaskField::SuccessorLinks);
        Ok(next)
    }

    /// Removes the link between two tasks from both endpoint lists.
    pub fn remove_task_link(&self, predecessor: TaskId, successor: TaskId) -> Result<Self> {
        if !self.has_link(predecessor, successor) {
            return Err(SchedError::UnknownLink {
                predecessor: self.ordinal_of(predecessor),
                successor: self.ordinal_of(successor),
            });
        }
        trace!(
            "remove link {} -> {}",
            self.ordinal_of(predecessor),
            self.ordinal_of(successor)
        );
        let mut next = self.clone();
        next.update_link_lists(successor, |links| {
            links.retain(|l| !(l.predecessor == predecessor && l.successor == successor));
        }, TaskField::PredecessorLinks);
        next.update_link_lists(predecessor, |links| {
            links.retain(|l| !(l.predecessor == predecessor && l.successor == successor));
        }, TaskField::SuccessorLinks);
        Ok(next)
    }

    pub fn has_link(&self, predecessor: TaskId, successor: TaskId) -> bool {
        self.task(successor)
            .map(|t| {
                t.predecessor_links()
                    .iter()
                    .any(|l| l.predecessor == predecessor)
            })
            .unwrap_or(false)
    }

    /// Breadth-first walk over predecessor links: is `target` reachable
    /// from `from`?
    fn reaches_by_predecessors(&self, from: TaskId, target: TaskId) -> bool {
        let mut queue = VecDeque::from([from]);
        let mut seen = vec![from];
        while let Some(current) = queue.pop_front() {
            let Some(task) = self.task(current) else {
                continue;
            };
            for link in task.predecessor_links().iter() {
                let next = link.predecessor;
                if next == target {
                    return true;
                }
                if !seen.contains(&next) {
                    seen.push(next);
                    queue.push_back(next);
                }
            }
        }
        false
    }

    // --- invariant maintenance ---

    fn update_link_lists(
        &mut self,
        id: TaskId,
        edit: impl FnOnce(&mut Vec<TaskLink>),
        field: TaskField,
    ) {
        if let Some(task) = self.tasks.get(&id) {
            let mut links: Vec<TaskLink> = match field {
                TaskField::PredecessorLinks => task.predecessor_links().to_vec(),
                _ => task.successor_links().to_vec(),
            };
            edit(&mut links);
            let updated = task.with_value(field, FieldValue::from(links));
            self.tasks.insert(id, Arc::new(updated));
        }
    }

    /// Re-derives dense ordinals, preserving the current order.
    fn renumber(&mut self) {
        let order = self.tasks_by_ordinal();
        for (i, task) in order.iter().enumerate() {
            let updated = task.with_value(TaskField::Ordinal, FieldValue::Integer(i as i64));
            self.tasks.insert(task.id(), Arc::new(updated));
        }
    }

    /// Re-sorts both link lists of every task by the other endpoint's
    /// ordinal; required after any renumbering.
    fn resort_links(&mut self) {
        let snapshot = self.clone();
        for (id, task) in self.tasks.clone() {
            let mut preds = task.predecessor_links().to_vec();
            preds.sort_by_key(|l| snapshot.ordinal_of(l.predecessor));
            let mut succs = task.successor_links().to_vec();
            succs.sort_by_key(|l| snapshot.ordinal_of(l.successor));
            let updated = task
                .with_value(TaskField::PredecessorLinks, FieldValue::from(preds))
                .with_value(TaskField::SuccessorLinks, FieldValue::from(succs));
            self.tasks.insert(id, Arc::new(updated));
        }
    }
}

fn strip_links(task: &TaskData, removed: TaskId) -> Arc<TaskData> {
    let preds: Vec<TaskLink> = task
        .predecessor_links()
        .iter()
        .filter(|l| l.predecessor != removed)
        .copied()
        .collect();
    let succs: Vec<TaskLink> = task
        .successor_links()
        .iter()
        .filter(|l| l.successor != removed)
        .copied()
        .collect();
    Arc::new(
        task.with_value(TaskField::PredecessorLinks, FieldValue::from(preds))
            .with_value(TaskField::SuccessorLinks, FieldValue::from(succs)),
    )
}

fn insert_sorted(links: &mut Vec<TaskLink>, link: TaskLink, key: impl Fn(&TaskLink) -> usize) {
    let pos = links
        .iter()
        .position(|l| key(l) > key(&link))
        .unwrap_or(links.len());
    links.insert(pos, link);
}
