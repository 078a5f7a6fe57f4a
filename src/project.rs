//! The project facade.
//!
//! [`Project`] wraps one immutable snapshot behind a convenient API:
//! every mutator runs the matching strategy, reschedules when the field
//! or operation affects scheduling, and returns a *new* project (or an
//! entity wrapper bound to one). The receiver is never touched, so any
//! number of historical projects stay alive and comparable.
//!
//! [`Task`], [`Resource`], and [`Assignment`] are thin handles pairing
//! a project with an identifier. They compare structurally: two handles
//! are equal when they name the same record in equal snapshots.
//!
//! [`CurrentProject`] is the seam for interactive callers: it holds the
//! snapshot currently considered "live", and swapping it notifies
//! observers with the old project, the new one, and their diff.

use std::sync::Arc;

use chrono::NaiveDateTime;
use log::debug;

use crate::changes::ProjectChanges;
use crate::error::Result;
use crate::models::{
    AssignmentData, AssignmentField, AssignmentId, Calendar, Duration, FieldValue, ProjectData,
    ProjectField, ProjectId, ResourceData, ResourceField, ResourceId, TaskData, TaskField, TaskId,
    TaskLink,
};
use crate::scheduler;

// ================================
// Project
// ================================

/// An immutable project: one snapshot plus the editing API.
#[derive(Debug, Clone)]
pub struct Project {
    data: Arc<ProjectData>,
}

impl Project {
    /// A project with no entities, scheduled and ready to edit.
    pub fn empty() -> Self {
        let data = ProjectData::new();
        let info = data.info().with_id(ProjectId::create());
        Self::from_data(data.with_info(info))
    }

    /// Wraps raw project data, scheduling it first.
    pub fn from_data(data: ProjectData) -> Self {
        Self {
            data: Arc::new(scheduler::schedule(&data)),
        }
    }

    /// The underlying snapshot.
    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    /// Identity of the project; shared by all of its snapshots.
    pub fn id(&self) -> ProjectId {
        self.data.info().id()
    }

    pub fn name(&self) -> &str {
        self.data.info().name()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.data.info().start()
    }

    pub fn calendar_name(&self) -> &str {
        self.data.info().calendar_name()
    }

    // --- entity access ---

    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.data.task(id).map(|_| Task {
            project: self.clone(),
            id,
        })
    }

    /// Task handles ordered by ordinal.
    pub fn tasks(&self) -> Vec<Task> {
        self.data
            .tasks_by_ordinal()
            .iter()
            .map(|t| Task {
                project: self.clone(),
                id: t.id(),
            })
            .collect()
    }

    pub fn task_by_ordinal(&self, ordinal: usize) -> Option<Task> {
        self.data.task_by_ordinal(ordinal).map(|t| Task {
            project: self.clone(),
            id: t.id(),
        })
    }

    pub fn resource(&self, id: ResourceId) -> Option<Resource> {
        self.data.resource(id).map(|_| Resource {
            project: self.clone(),
            id,
        })
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.data
            .resources()
            .map(|r| Resource {
                project: self.clone(),
                id: r.id(),
            })
            .collect()
    }

    pub fn assignment(&self, id: AssignmentId) -> Option<Assignment> {
        self.data.assignment(id).map(|_| Assignment {
            project: self.clone(),
            id,
        })
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        self.data
            .assignments()
            .map(|a| Assignment {
                project: self.clone(),
                id: a.id(),
            })
            .collect()
    }

    // --- construction ---

    /// Adds a task under a fresh identifier.
    pub fn add_task(&self) -> Result<Task> {
        self.add_task_with_id(TaskId::create())
    }

    pub fn add_task_with_id(&self, id: TaskId) -> Result<Task> {
        let project = self.rescheduled(self.data.add_task(id)?);
        Ok(Task { project, id })
    }

    /// Adds a resource under a fresh identifier.
    pub fn add_resource(&self) -> Result<Resource> {
        self.add_resource_with_id(ResourceId::create())
    }

    pub fn add_resource_with_id(&self, id: ResourceId) -> Result<Resource> {
        let project = self.rescheduled(self.data.add_resource(id)?);
        Ok(Resource { project, id })
    }

    /// Assigns a resource to a task under a fresh identifier, seeding
    /// the assignment's work.
    pub fn add_assignment(&self, task: TaskId, resource: ResourceId) -> Result<Assignment> {
        self.add_assignment_with_id(AssignmentId::create(), task, resource)
    }

    pub fn add_assignment_with_id(
        &self,
        id: AssignmentId,
        task: TaskId,
        resource: ResourceId,
    ) -> Result<Assignment> {
        let next = scheduler::add_assignment(&self.data, id, task, resource)?;
        let project = self.rescheduled(next);
        Ok(Assignment { project, id })
    }

    // --- removal ---

    pub fn remove_task(&self, id: TaskId) -> Result<Project> {
        Ok(self.rescheduled(self.data.remove_task(id)?))
    }

    pub fn remove_resource(&self, id: ResourceId) -> Result<Project> {
        Ok(self.rescheduled(scheduler::remove_resource(&self.data, id)?))
    }

    pub fn remove_assignment(&self, id: AssignmentId) -> Result<Project> {
        Ok(self.rescheduled(scheduler::remove_assignment(&self.data, id)?))
    }

    // --- links ---

    /// Links two tasks finish-to-start.
    pub fn link_tasks(&self, predecessor: TaskId, successor: TaskId) -> Result<Project> {
        self.add_task_link(TaskLink::finish_to_start(predecessor, successor))
    }

    pub fn add_task_link(&self, link: TaskLink) -> Result<Project> {
        Ok(self.rescheduled(self.data.add_task_link(link)?))
    }

    pub fn remove_task_link(&self, predecessor: TaskId, successor: TaskId) -> Result<Project> {
        Ok(self.rescheduled(self.data.remove_task_link(predecessor, successor)?))
    }

    // --- project settings ---

    pub fn set_name(&self, name: impl Into<String>) -> Project {
        // A rename never moves a date.
        self.with_data(self.data.with_info(self.data.info().with_name(name)))
    }

    pub fn set_start(&self, start: NaiveDateTime) -> Project {
        self.rescheduled(self.data.with_info(self.data.info().with_start(start)))
    }

    pub fn add_calendar(&self, calendar: Calendar) -> Project {
        self.rescheduled(self.data.with_info(self.data.info().with_added_calendar(calendar)))
    }

    pub fn set_calendar(&self, name: &str) -> Result<Project> {
        Ok(self.rescheduled(self.data.with_info(self.data.info().with_calendar(name)?)))
    }

    pub fn remove_calendar(&self, name: &str) -> Result<Project> {
        Ok(self.with_data(self.data.with_info(self.data.info().with_removed_calendar(name)?)))
    }

    // --- diffing ---

    /// The changes from `old` to this project.
    pub fn get_changes(&self, old: &Project) -> ProjectChanges {
        ProjectChanges::compute(&old.data, &self.data)
    }

    fn rescheduled(&self, data: ProjectData) -> Project {
        Project {
            data: Arc::new(scheduler::schedule(&data)),
        }
    }

    fn with_data(&self, data: ProjectData) -> Project {
        Project {
            data: Arc::new(data),
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Project {
    /// Structural equality over the snapshot.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

// ================================
// Entity handles
// ================================

macro_rules! handle_eq {
    ($handle:ident) => {
        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id && self.project == other.project
            }
        }
    };
}

/// A task in one specific project snapshot.
#[derive(Debug, Clone)]
pub struct Task {
    project: Project,
    id: TaskId,
}

handle_eq!(Task);

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The project this handle reads from.
    pub fn project(&self) -> &Project {
        &self.project
    }

    fn record(&self) -> Option<&Arc<TaskData>> {
        self.project.data.task(self.id)
    }

    /// The field's value; derived text fields are computed on the fly.
    pub fn get_value(&self, field: TaskField) -> FieldValue {
        match self.record() {
            Some(record) => scheduler::task_field_value(&self.project.data, record, field),
            None => field.default_value(),
        }
    }

    /// Writes the field through its strategy and reschedules when the
    /// field affects scheduling; returns the handle in the new project.
    pub fn set_value(&self, field: TaskField, value: FieldValue) -> Result<Task> {
        let next = scheduler::set_task_field(&self.project.data, self.id, field, value)?;
        let project = if field.definition().affects_schedule {
            self.project.rescheduled(next)
        } else {
            self.project.with_data(next)
        };
        Ok(Task {
            project,
            id: self.id,
        })
    }

    pub fn name(&self) -> String {
        self.record().map(|t| t.name()).unwrap_or_default()
    }

    pub fn ordinal(&self) -> usize {
        self.record().map(|t| t.ordinal()).unwrap_or_default()
    }

    pub fn duration(&self) -> Duration {
        self.record().map(|t| t.duration()).unwrap_or_default()
    }

    pub fn work(&self) -> Duration {
        self.record().map(|t| t.work()).unwrap_or_default()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.record().and_then(|t| t.start())
    }

    pub fn finish(&self) -> Option<NaiveDateTime> {
        self.record().and_then(|t| t.finish())
    }

    pub fn total_slack(&self) -> Duration {
        self.record().map(|t| t.total_slack()).unwrap_or_default()
    }

    pub fn is_critical(&self) -> bool {
        self.record().map(|t| t.is_critical()).unwrap_or_default()
    }

    /// Predecessor list text, e.g. `"0,1FS+2 days"`.
    pub fn predecessors(&self) -> String {
        self.get_value(TaskField::Predecessors)
            .as_text()
            .unwrap_or_default()
            .to_string()
    }

    /// Resource list text, e.g. `"Res1 [10%], Res2"`.
    pub fn resource_names(&self) -> String {
        self.get_value(TaskField::ResourceNames)
            .as_text()
            .unwrap_or_default()
            .to_string()
    }

    pub fn set_name(&self, name: &str) -> Result<Task> {
        self.set_value(TaskField::Name, name.into())
    }

    pub fn set_duration(&self, duration: Duration) -> Result<Task> {
        self.set_value(TaskField::Duration, FieldValue::Duration(duration))
    }

    pub fn set_work(&self, work: Duration) -> Result<Task> {
        self.set_value(TaskField::Work, FieldValue::Duration(work))
    }

    pub fn set_start(&self, start: NaiveDateTime) -> Result<Task> {
        self.set_value(TaskField::Start, FieldValue::from(start))
    }

    pub fn set_finish(&self, finish: NaiveDateTime) -> Result<Task> {
        self.set_value(TaskField::Finish, FieldValue::from(finish))
    }

    pub fn set_predecessors(&self, text: &str) -> Result<Task> {
        self.set_value(TaskField::Predecessors, text.into())
    }

    pub fn set_resource_names(&self, text: &str) -> Result<Task> {
        self.set_value(TaskField::ResourceNames, text.into())
    }
}

/// A resource in one specific project snapshot.
#[derive(Debug, Clone)]
pub struct Resource {
    project: Project,
    id: ResourceId,
}

handle_eq!(Resource);

impl Resource {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn record(&self) -> Option<&Arc<ResourceData>> {
        self.project.data.resource(self.id)
    }

    pub fn get_value(&self, field: ResourceField) -> FieldValue {
        self.record()
            .map(|r| r.get_value(field))
            .unwrap_or_else(|| field.default_value())
    }

    pub fn set_value(&self, field: ResourceField, value: FieldValue) -> Result<Resource> {
        let next = scheduler::set_resource_field(&self.project.data, self.id, field, value)?;
        // Resource fields never affect scheduling.
        Ok(Resource {
            project: self.project.with_data(next),
            id: self.id,
        })
    }

    pub fn name(&self) -> String {
        self.record().map(|r| r.name()).unwrap_or_default()
    }

    pub fn set_name(&self, name: &str) -> Result<Resource> {
        self.set_value(ResourceField::Name, name.into())
    }

    /// Assignments this resource holds, in the handle's project.
    pub fn assignments(&self) -> Vec<Assignment> {
        self.project
            .data
            .assignments_for_resource(self.id)
            .iter()
            .map(|a| Assignment {
                project: self.project.clone(),
                id: a.id(),
            })
            .collect()
    }
}

/// An assignment in one specific project snapshot.
#[derive(Debug, Clone)]
pub struct Assignment {
    project: Project,
    id: AssignmentId,
}

handle_eq!(Assignment);

impl Assignment {
    pub fn id(&self) -> AssignmentId {
        self.id
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn record(&self) -> Option<&Arc<AssignmentData>> {
        self.project.data.assignment(self.id)
    }

    pub fn get_value(&self, field: AssignmentField) -> FieldValue {
        self.record()
            .map(|a| a.get_value(field))
            .unwrap_or_else(|| field.default_value())
    }

    pub fn set_value(&self, field: AssignmentField, value: FieldValue) -> Result<Assignment> {
        let next = scheduler::set_assignment_field(&self.project.data, self.id, field, value)?;
        let project = if field.definition().affects_schedule {
            self.project.rescheduled(next)
        } else {
            self.project.with_data(next)
        };
        Ok(Assignment {
            project,
            id: self.id,
        })
    }

    pub fn task(&self) -> Option<Task> {
        self.record().and_then(|a| self.project.task(a.task()))
    }

    pub fn resource(&self) -> Option<Resource> {
        self.record().and_then(|a| self.project.resource(a.resource()))
    }

    pub fn units(&self) -> f64 {
        self.record().map(|a| a.units()).unwrap_or(1.0)
    }

    pub fn work(&self) -> Duration {
        self.record().map(|a| a.work()).unwrap_or_default()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.record().and_then(|a| a.start())
    }

    pub fn finish(&self) -> Option<NaiveDateTime> {
        self.record().and_then(|a| a.finish())
    }

    pub fn set_units(&self, units: f64) -> Result<Assignment> {
        self.set_value(AssignmentField::Units, FieldValue::Percent(units))
    }

    pub fn set_work(&self, work: Duration) -> Result<Assignment> {
        self.set_value(AssignmentField::Work, FieldValue::Duration(work))
    }
}

// ================================
// Current-project seam
// ================================

/// Payload delivered to observers when the current project changes.
#[derive(Debug, Clone)]
pub struct ProjectChanged {
    pub old: Project,
    pub new: Project,
    pub changes: ProjectChanges,
}

type Observer = Box<dyn Fn(&ProjectChanged)>;

/// Holds the snapshot considered current and notifies observers when it
/// is replaced. The core never decides which snapshot wins; this does.
#[derive(Default)]
pub struct CurrentProject {
    current: Project,
    observers: Vec<Observer>,
}

impl CurrentProject {
    pub fn new(project: Project) -> Self {
        Self {
            current: project,
            observers: Vec::new(),
        }
    }

    pub fn current(&self) -> &Project {
        &self.current
    }

    /// Registers a change observer.
    pub fn observe(&mut self, observer: impl Fn(&ProjectChanged) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Makes `next` current, notifying observers with the diff.
    pub fn replace(&mut self, next: Project) -> ProjectChanges {
        let changes = next.get_changes(&self.current);
        debug!(
            "project replaced: {} task, {} resource, {} assignment changes",
            changes.tasks.len(),
            changes.resources.len(),
            changes.assignments.len()
        );
        let event = ProjectChanged {
            old: std::mem::replace(&mut self.current, next.clone()),
            new: next,
            changes: changes.clone(),
        };
        for observer in &self.observers {
            observer(&event);
        }
        changes
    }
}

impl std::fmt::Debug for CurrentProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentProject")
            .field("current", &self.current)
            .field("observers", &self.observers.len())
            .finish()
    }
}
