//! Critical-path scheduling over persistent project snapshots.
//!
//! Provides immutable project data with structural sharing, a typed
//! field system, precedence links with cycle prevention, calendar-aware
//! critical-path scheduling, and snapshot diffing. Editing never
//! mutates; every operation derives a new snapshot and reschedules it,
//! so histories, undo stacks, and concurrent readers all hold plain
//! values.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `ProjectData`, `TaskData`,
//!   `ResourceData`, `AssignmentData`, `Calendar`, `TaskLink`,
//!   `WorkContour`, the field registries
//! - **`scheduler`**: Critical-path pass and the field-write strategies
//! - **`changes`**: Snapshot-to-snapshot diffs
//! - **`project`**: The facade — [`Project`], entity handles, and the
//!   [`CurrentProject`] observer seam
//! - **`error`**: The [`SchedError`] type shared by every fallible path
//!
//! # Architecture
//!
//! `models` holds values only; the scheduler reads one snapshot and
//! writes the next; the facade strings snapshots together and decides
//! which one is current. Nothing below the facade holds mutable state,
//! so a snapshot taken at any point stays valid forever.
//!
//! # Examples
//!
//! ```
//! use cpm_core::models::Duration;
//! use cpm_core::Project;
//!
//! # fn main() -> cpm_core::Result<()> {
//! let project = Project::empty();
//! let design = project
//!     .add_task()?
//!     .set_name("Design")?
//!     .set_duration(Duration::days(10))?;
//! let build = design.project().add_task()?.set_duration(Duration::days(5))?;
//! let project = build.project().link_tasks(design.id(), build.id())?;
//!
//! let design = project.task(design.id()).unwrap();
//! let build = project.task(build.id()).unwrap();
//! assert!(build.start() >= design.finish());
//! assert!(design.is_critical() && build.is_critical());
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-path planning and scheduling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod changes;
pub mod error;
pub mod models;
pub mod project;
pub mod scheduler;

pub use changes::{ChangeSet, EntityChanges, FieldChange, ProjectChanges};
pub use error::{Result, SchedError};
pub use project::{Assignment, CurrentProject, Project, ProjectChanged, Resource, Task};
