//! Critical-path scheduling and field setter strategies.
//!
//! # Algorithm
//!
//! [`schedule`] is a pure function over a project snapshot: a forward
//! topological pass computes early windows, a reverse pass computes
//! late windows, and the difference yields slack. Tasks with zero total
//! slack are critical. Scheduling its own output changes nothing.
//!
//! # Setters
//!
//! Some field writes are compound: storing a task's `Duration` also
//! re-levels assignment work, writing `Start` becomes a constraint, and
//! the predecessor/resource text fields edit structure. Those
//! strategies live in this module so the records themselves stay plain
//! value stores.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

mod cpm;
mod ops;
mod setters;

pub use cpm::schedule;
pub(crate) use ops::{add_assignment, remove_assignment, remove_resource};
pub(crate) use setters::{
    set_assignment_field, set_resource_field, set_task_field, task_field_value,
};
