//! Project domain models.
//!
//! Provides the core data types for representing a project: immutable
//! task, resource, and assignment records with typed fields, working
//! calendars, precedence links, and the persistent [`ProjectData`]
//! snapshot that aggregates them. Everything here is a value; mutation
//! always means deriving a new snapshot.

mod calendar;
mod contour;
mod data;
mod duration;
mod fields;
mod ident;
mod link;
mod project_data;

pub use calendar::{Calendar, WorkingDay, WorkingTime, WorkingWeek};
pub use contour::{ContourKind, ContourSegment, WorkContour};
pub use data::{AssignmentData, EntityData, FieldMap, ResourceData, TaskData};
pub use duration::{Duration, DurationUnit};
pub use fields::{
    AssignmentField, ConstraintType, FieldDefinition, FieldKind, FieldValue, ProjectField,
    ResourceField, TaskField, ASSIGNMENT_FIELDS, RESOURCE_FIELDS, TASK_FIELDS,
};
pub use ident::{AssignmentId, ProjectId, ResourceId, TaskId};
pub use link::{LinkType, PredecessorEntry, TaskLink};
pub use project_data::{ProjectData, ProjectInfo};
