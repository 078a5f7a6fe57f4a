//! Typed field descriptors, kinds, and values.
//!
//! Every entity attribute is addressed by a small identity enum
//! ([`TaskField`], [`ResourceField`], [`AssignmentField`]) and described
//! by a [`FieldDefinition`] in a static, ordered registry per entity
//! kind. Values travel as the closed [`FieldValue`] enum; a field's
//! [`FieldKind`] determines which variant it stores and centralizes the
//! text behavior — formatting, parsing, and input suggestions.
//!
//! # Flags
//! - `read_only`: owned by the scheduler or fixed at creation; writes
//!   through the public API are rejected.
//! - `computed`: never stored on a record. Reads assemble the value on
//!   demand and writes are routed to a strategy (predecessor text,
//!   resource-name text).
//! - `affects_schedule`: a write requires a scheduling pass; writes to
//!   other fields skip it.

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::duration::{Duration, DurationUnit};
use super::ident::{ResourceId, TaskId};
use super::link::TaskLink;
use crate::error::{Result, SchedError};

// ================================
// Constraint types
// ================================

/// Scheduling constraint stored on a task.
///
/// Displays title-cased (`"Start No Earlier Than"`); parsing accepts the
/// title-cased form or the bare identifier, case-insensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Schedule as early as the graph allows (the default).
    #[default]
    AsSoonAsPossible,
    /// Stored intent only; scheduled like [`ConstraintType::AsSoonAsPossible`].
    AsLateAsPossible,
    /// The task must not start before the constraint date.
    StartNoEarlierThan,
    /// The task must not finish before the constraint date.
    FinishNoEarlierThan,
}

impl ConstraintType {
    pub const ALL: [ConstraintType; 4] = [
        ConstraintType::AsSoonAsPossible,
        ConstraintType::AsLateAsPossible,
        ConstraintType::StartNoEarlierThan,
        ConstraintType::FinishNoEarlierThan,
    ];

    /// Whether the type carries a constraint date.
    pub const fn requires_date(self) -> bool {
        matches!(
            self,
            ConstraintType::StartNoEarlierThan | ConstraintType::FinishNoEarlierThan
        )
    }

    const fn identifier(self) -> &'static str {
        match self {
            ConstraintType::AsSoonAsPossible => "AsSoonAsPossible",
            ConstraintType::AsLateAsPossible => "AsLateAsPossible",
            ConstraintType::StartNoEarlierThan => "StartNoEarlierThan",
            ConstraintType::FinishNoEarlierThan => "FinishNoEarlierThan",
        }
    }
}

impl fmt::Display for ConstraintType {
    /// Title-cases the identifier: a space before each inner capital.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.identifier().chars().enumerate() {
            if i > 0 && c.is_ascii_uppercase() {
                f.write_char(' ')?;
            }
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl FromStr for ConstraintType {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|ct| key.eq_ignore_ascii_case(ct.identifier()))
            .ok_or_else(|| SchedError::parse("constraint type", s))
    }
}

// ================================
// Field kinds
// ================================

/// The primitive type plus text behavior of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// A working-time span displayed in days.
    DurationDays,
    /// A working-time span displayed in hours.
    WorkHours,
    /// An optional timestamp, `"%Y-%m-%d %H:%M"`.
    Date,
    /// A fraction displayed as a percentage (`0.5` renders `"50%"`).
    Percent,
    /// `"Yes"` / `"No"`.
    Bool,
    /// A plain integer.
    Integer,
    /// A [`ConstraintType`].
    Constraint,
    /// A shared task-link list; renders empty (display goes through the
    /// computed predecessor-text field, which has project context).
    Links,
    /// A task reference.
    TaskRef,
    /// A resource reference.
    ResourceRef,
}

impl FieldKind {
    /// The kind's zero value.
    pub fn default_value(self) -> FieldValue {
        match self {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::DurationDays | FieldKind::WorkHours => {
                FieldValue::Duration(Duration::zero())
            }
            FieldKind::Date => FieldValue::Date(None),
            FieldKind::Percent => FieldValue::Percent(0.0),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Integer => FieldValue::Integer(0),
            FieldKind::Constraint => FieldValue::Constraint(ConstraintType::default()),
            FieldKind::Links => FieldValue::Links(Arc::from(Vec::new())),
            FieldKind::TaskRef => FieldValue::TaskRef(TaskId::nil()),
            FieldKind::ResourceRef => FieldValue::ResourceRef(ResourceId::nil()),
        }
    }

    /// Renders a value of this kind. Mismatched variants render empty.
    pub fn format(self, value: &FieldValue) -> String {
        match (self, value) {
            (FieldKind::Text, FieldValue::Text(s)) => s.clone(),
            (FieldKind::DurationDays, FieldValue::Duration(d)) => d.format_days(),
            (FieldKind::WorkHours, FieldValue::Duration(d)) => d.format_hours(),
            (FieldKind::Date, FieldValue::Date(Some(t))) => {
                t.format("%Y-%m-%d %H:%M").to_string()
            }
            (FieldKind::Date, FieldValue::Date(None)) => String::new(),
            (FieldKind::Percent, FieldValue::Percent(p)) => {
                format!("{}%", trim_percent(p * 100.0))
            }
            (FieldKind::Bool, FieldValue::Bool(b)) => {
                if *b { "Yes" } else { "No" }.to_string()
            }
            (FieldKind::Integer, FieldValue::Integer(i)) => i.to_string(),
            (FieldKind::Constraint, FieldValue::Constraint(ct)) => ct.to_string(),
            (FieldKind::Links, FieldValue::Links(_)) => String::new(),
            (FieldKind::TaskRef, FieldValue::TaskRef(id)) => id.to_string(),
            (FieldKind::ResourceRef, FieldValue::ResourceRef(id)) => id.to_string(),
            _ => String::new(),
        }
    }

    /// Parses text into a value of this kind.
    pub fn parse(self, text: &str) -> Result<FieldValue> {
        match self {
            FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
            FieldKind::DurationDays => {
                Duration::parse(text, DurationUnit::Days).map(FieldValue::Duration)
            }
            FieldKind::WorkHours => {
                Duration::parse(text, DurationUnit::Hours).map(FieldValue::Duration)
            }
            FieldKind::Date => parse_date(text).map(FieldValue::Date),
            FieldKind::Percent => {
                let body = text.trim().trim_end_matches('%').trim_end();
                let percent: f64 = body
                    .parse()
                    .map_err(|_| SchedError::parse("percent", text))?;
                if !percent.is_finite() {
                    return Err(SchedError::parse("percent", text));
                }
                Ok(FieldValue::Percent(percent / 100.0))
            }
            FieldKind::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" => Ok(FieldValue::Bool(true)),
                "no" | "false" => Ok(FieldValue::Bool(false)),
                _ => Err(SchedError::parse("boolean", text)),
            },
            FieldKind::Integer => text
                .trim()
                .parse()
                .map(FieldValue::Integer)
                .map_err(|_| SchedError::parse("integer", text)),
            FieldKind::Constraint => text.parse().map(FieldValue::Constraint),
            FieldKind::Links => Err(SchedError::parse("links", text)),
            FieldKind::TaskRef => text.parse().map(FieldValue::TaskRef),
            FieldKind::ResourceRef => text.parse().map(FieldValue::ResourceRef),
        }
    }

    /// Input completions for enumerable kinds; empty otherwise.
    pub fn suggestions(self) -> &'static [&'static str] {
        match self {
            FieldKind::Bool => &["Yes", "No"],
            FieldKind::Constraint => &[
                "As Soon As Possible",
                "As Late As Possible",
                "Start No Earlier Than",
                "Finish No Earlier Than",
            ],
            _ => &[],
        }
    }

    const fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::DurationDays => "duration",
            FieldKind::WorkHours => "work",
            FieldKind::Date => "date",
            FieldKind::Percent => "percent",
            FieldKind::Bool => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Constraint => "constraint",
            FieldKind::Links => "links",
            FieldKind::TaskRef => "task reference",
            FieldKind::ResourceRef => "resource reference",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn parse_date(text: &str) -> Result<Option<NaiveDateTime>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .map(Some)
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0))
                .map_err(|_| SchedError::parse("date", text))
        })
}

fn trim_percent(value: f64) -> String {
    let mut s = format!("{value:.2}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

// ================================
// Field values
// ================================

/// A stored field value; one variant per [`FieldKind`] primitive.
///
/// The two duration-flavored kinds share the [`FieldValue::Duration`]
/// variant; nullability lives only in [`FieldValue::Date`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Duration(Duration),
    Date(Option<NaiveDateTime>),
    Percent(f64),
    Bool(bool),
    Integer(i64),
    Constraint(ConstraintType),
    Links(Arc<[TaskLink]>),
    TaskRef(TaskId),
    ResourceRef(ResourceId),
}

impl FieldValue {
    /// Whether this value can be stored in a field of `kind`.
    pub fn matches(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Text(_), FieldKind::Text)
                | (
                    FieldValue::Duration(_),
                    FieldKind::DurationDays | FieldKind::WorkHours
                )
                | (FieldValue::Date(_), FieldKind::Date)
                | (FieldValue::Percent(_), FieldKind::Percent)
                | (FieldValue::Bool(_), FieldKind::Bool)
                | (FieldValue::Integer(_), FieldKind::Integer)
                | (FieldValue::Constraint(_), FieldKind::Constraint)
                | (FieldValue::Links(_), FieldKind::Links)
                | (FieldValue::TaskRef(_), FieldKind::TaskRef)
                | (FieldValue::ResourceRef(_), FieldKind::ResourceRef)
        )
    }

    /// The representative kind of the stored variant.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Duration(_) => FieldKind::DurationDays,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Percent(_) => FieldKind::Percent,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Constraint(_) => FieldKind::Constraint,
            FieldValue::Links(_) => FieldKind::Links,
            FieldValue::TaskRef(_) => FieldKind::TaskRef,
            FieldValue::ResourceRef(_) => FieldKind::ResourceRef,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            FieldValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Option<NaiveDateTime>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_percent(&self) -> Option<f64> {
        match self {
            FieldValue::Percent(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_constraint(&self) -> Option<ConstraintType> {
        match self {
            FieldValue::Constraint(ct) => Some(*ct),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Option<&Arc<[TaskLink]>> {
        match self {
            FieldValue::Links(links) => Some(links),
            _ => None,
        }
    }

    pub fn as_task_ref(&self) -> Option<TaskId> {
        match self {
            FieldValue::TaskRef(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_resource_ref(&self) -> Option<ResourceId> {
        match self {
            FieldValue::ResourceRef(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(t: NaiveDateTime) -> Self {
        FieldValue::Date(Some(t))
    }
}

impl From<Option<NaiveDateTime>> for FieldValue {
    fn from(t: Option<NaiveDateTime>) -> Self {
        FieldValue::Date(t)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<ConstraintType> for FieldValue {
    fn from(ct: ConstraintType) -> Self {
        FieldValue::Constraint(ct)
    }
}

impl From<Vec<TaskLink>> for FieldValue {
    fn from(links: Vec<TaskLink>) -> Self {
        FieldValue::Links(Arc::from(links))
    }
}

impl From<TaskId> for FieldValue {
    fn from(id: TaskId) -> Self {
        FieldValue::TaskRef(id)
    }
}

impl From<ResourceId> for FieldValue {
    fn from(id: ResourceId) -> Self {
        FieldValue::ResourceRef(id)
    }
}

// ================================
// Field identities and registries
// ================================

/// A field identity backed by a static registry entry.
pub trait ProjectField: Copy + Eq + Ord + fmt::Debug + 'static {
    /// The registry entry describing this field.
    fn definition(self) -> &'static FieldDefinition<Self>;

    /// Resolved default: the kind default unless the field overrides it.
    fn default_value(self) -> FieldValue {
        self.definition().kind.default_value()
    }
}

/// Immutable descriptor for one field of one entity kind.
#[derive(Debug)]
pub struct FieldDefinition<F: 'static> {
    pub field: F,
    /// Display name, as shown in column headers and error messages.
    pub name: &'static str,
    pub kind: FieldKind,
    pub read_only: bool,
    pub computed: bool,
    pub affects_schedule: bool,
}

macro_rules! field_def {
    ($field:expr, $name:literal, $kind:expr, ro: $ro:literal, virt: $virt:literal, sched: $sched:literal) => {
        FieldDefinition {
            field: $field,
            name: $name,
            kind: $kind,
            read_only: $ro,
            computed: $virt,
            affects_schedule: $sched,
        }
    };
}

/// Task field identities, in display/registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskField {
    Name,
    Notes,
    Ordinal,
    Duration,
    Work,
    Start,
    Finish,
    EarlyStart,
    EarlyFinish,
    LateStart,
    LateFinish,
    StartSlack,
    FinishSlack,
    TotalSlack,
    Critical,
    ConstraintType,
    ConstraintDate,
    PredecessorLinks,
    SuccessorLinks,
    Predecessors,
    ResourceNames,
}

/// Ordered task field registry; index matches the enum discriminant.
pub static TASK_FIELDS: &[FieldDefinition<TaskField>] = &[
    field_def!(TaskField::Name, "Name", FieldKind::Text, ro: false, virt: false, sched: false),
    field_def!(TaskField::Notes, "Notes", FieldKind::Text, ro: false, virt: false, sched: false),
    field_def!(TaskField::Ordinal, "Ordinal", FieldKind::Integer, ro: false, virt: false, sched: true),
    field_def!(TaskField::Duration, "Duration", FieldKind::DurationDays, ro: false, virt: false, sched: true),
    field_def!(TaskField::Work, "Work", FieldKind::WorkHours, ro: false, virt: false, sched: true),
    field_def!(TaskField::Start, "Start", FieldKind::Date, ro: false, virt: false, sched: true),
    field_def!(TaskField::Finish, "Finish", FieldKind::Date, ro: false, virt: false, sched: true),
    field_def!(TaskField::EarlyStart, "Early Start", FieldKind::Date, ro: true, virt: false, sched: false),
    field_def!(TaskField::EarlyFinish, "Early Finish", FieldKind::Date, ro: true, virt: false, sched: false),
    field_def!(TaskField::LateStart, "Late Start", FieldKind::Date, ro: true, virt: false, sched: false),
    field_def!(TaskField::LateFinish, "Late Finish", FieldKind::Date, ro: true, virt: false, sched: false),
    field_def!(TaskField::StartSlack, "Start Slack", FieldKind::DurationDays, ro: true, virt: false, sched: false),
    field_def!(TaskField::FinishSlack, "Finish Slack", FieldKind::DurationDays, ro: true, virt: false, sched: false),
    field_def!(TaskField::TotalSlack, "Total Slack", FieldKind::DurationDays, ro: true, virt: false, sched: false),
    field_def!(TaskField::Critical, "Critical", FieldKind::Bool, ro: true, virt: false, sched: false),
    field_def!(TaskField::ConstraintType, "Constraint Type", FieldKind::Constraint, ro: false, virt: false, sched: true),
    field_def!(TaskField::ConstraintDate, "Constraint Date", FieldKind::Date, ro: false, virt: false, sched: true),
    field_def!(TaskField::PredecessorLinks, "Predecessor Links", FieldKind::Links, ro: true, virt: false, sched: false),
    field_def!(TaskField::SuccessorLinks, "Successor Links", FieldKind::Links, ro: true, virt: false, sched: false),
    field_def!(TaskField::Predecessors, "Predecessors", FieldKind::Text, ro: false, virt: true, sched: true),
    field_def!(TaskField::ResourceNames, "Resource Names", FieldKind::Text, ro: false, virt: true, sched: true),
];

impl ProjectField for TaskField {
    fn definition(self) -> &'static FieldDefinition<TaskField> {
        &TASK_FIELDS[self as usize]
    }
}

/// Resource field identities, in display/registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceField {
    Name,
    Initials,
    Notes,
}

/// Ordered resource field registry; index matches the enum discriminant.
pub static RESOURCE_FIELDS: &[FieldDefinition<ResourceField>] = &[
    field_def!(ResourceField::Name, "Name", FieldKind::Text, ro: false, virt: false, sched: false),
    field_def!(ResourceField::Initials, "Initials", FieldKind::Text, ro: false, virt: false, sched: false),
    field_def!(ResourceField::Notes, "Notes", FieldKind::Text, ro: false, virt: false, sched: false),
];

impl ProjectField for ResourceField {
    fn definition(self) -> &'static FieldDefinition<ResourceField> {
        &RESOURCE_FIELDS[self as usize]
    }
}

/// Assignment field identities, in display/registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssignmentField {
    Task,
    Resource,
    Units,
    Work,
    Start,
    Finish,
}

/// Ordered assignment field registry; index matches the enum discriminant.
pub static ASSIGNMENT_FIELDS: &[FieldDefinition<AssignmentField>] = &[
    field_def!(AssignmentField::Task, "Task", FieldKind::TaskRef, ro: true, virt: false, sched: false),
    field_def!(AssignmentField::Resource, "Resource", FieldKind::ResourceRef, ro: true, virt: false, sched: false),
    field_def!(AssignmentField::Units, "Units", FieldKind::Percent, ro: false, virt: false, sched: true),
    field_def!(AssignmentField::Work, "Work", FieldKind::WorkHours, ro: false, virt: false, sched: true),
    field_def!(AssignmentField::Start, "Start", FieldKind::Date, ro: true, virt: false, sched: false),
    field_def!(AssignmentField::Finish, "Finish", FieldKind::Date, ro: true, virt: false, sched: false),
];

impl ProjectField for AssignmentField {
    fn definition(self) -> &'static FieldDefinition<AssignmentField> {
        &ASSIGNMENT_FIELDS[self as usize]
    }

    /// Units defaults to a full-time 100%; everything else to the kind zero.
    fn default_value(self) -> FieldValue {
        match self {
            AssignmentField::Units => FieldValue::Percent(1.0),
            _ => self.definition().kind.default_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_is_aligned<F: ProjectField>(defs: &'static [FieldDefinition<F>], all: &[F]) {
        assert_eq!(defs.len(), all.len());
        for (i, field) in all.iter().enumerate() {
            assert_eq!(defs[i].field, *field, "slot {i}");
            assert!(std::ptr::eq(field.definition(), &defs[i]));
        }
    }

    #[test]
    fn test_task_registry_alignment() {
        use TaskField::*;
        registry_is_aligned(
            TASK_FIELDS,
            &[
                Name, Notes, Ordinal, Duration, Work, Start, Finish, EarlyStart, EarlyFinish,
                LateStart, LateFinish, StartSlack, FinishSlack, TotalSlack, Critical,
                ConstraintType, ConstraintDate, PredecessorLinks, SuccessorLinks, Predecessors,
                ResourceNames,
            ],
        );
    }

    #[test]
    fn test_resource_registry_alignment() {
        use ResourceField::*;
        registry_is_aligned(RESOURCE_FIELDS, &[Name, Initials, Notes]);
    }

    #[test]
    fn test_assignment_registry_alignment() {
        use AssignmentField::*;
        registry_is_aligned(ASSIGNMENT_FIELDS, &[Task, Resource, Units, Work, Start, Finish]);
    }

    #[test]
    fn test_scheduler_outputs_are_read_only() {
        for field in [
            TaskField::EarlyStart,
            TaskField::LateFinish,
            TaskField::TotalSlack,
            TaskField::Critical,
        ] {
            assert!(field.definition().read_only, "{field:?}");
        }
        assert!(AssignmentField::Start.definition().read_only);
        assert!(!TaskField::Duration.definition().read_only);
    }

    #[test]
    fn test_virtual_text_fields_are_computed() {
        assert!(TaskField::Predecessors.definition().computed);
        assert!(TaskField::ResourceNames.definition().computed);
        assert!(!TaskField::Name.definition().computed);
    }

    #[test]
    fn test_units_default_is_full_time() {
        assert_eq!(
            AssignmentField::Units.default_value(),
            FieldValue::Percent(1.0)
        );
        assert_eq!(
            AssignmentField::Work.default_value(),
            FieldValue::Duration(Duration::zero())
        );
    }

    #[test]
    fn test_constraint_display_and_parse() {
        let ct = ConstraintType::StartNoEarlierThan;
        assert_eq!(ct.to_string(), "Start No Earlier Than");
        assert_eq!("Start No Earlier Than".parse::<ConstraintType>().unwrap(), ct);
        assert_eq!("startnoearlierthan".parse::<ConstraintType>().unwrap(), ct);
        assert_eq!(
            "FinishNoEarlierThan".parse::<ConstraintType>().unwrap(),
            ConstraintType::FinishNoEarlierThan
        );
        assert!("Sometime Later".parse::<ConstraintType>().is_err());
    }

    #[test]
    fn test_constraint_date_requirements() {
        assert!(!ConstraintType::AsSoonAsPossible.requires_date());
        assert!(!ConstraintType::AsLateAsPossible.requires_date());
        assert!(ConstraintType::StartNoEarlierThan.requires_date());
        assert!(ConstraintType::FinishNoEarlierThan.requires_date());
    }

    #[test]
    fn test_percent_format_and_parse() {
        let v = FieldKind::Percent.parse("50%").unwrap();
        assert_eq!(v, FieldValue::Percent(0.5));
        assert_eq!(FieldKind::Percent.format(&v), "50%");
        assert_eq!(
            FieldKind::Percent.format(&FieldValue::Percent(0.125)),
            "12.5%"
        );
        // Bare numbers are percentages too.
        assert_eq!(
            FieldKind::Percent.parse("100").unwrap(),
            FieldValue::Percent(1.0)
        );
        assert!(FieldKind::Percent.parse("half").is_err());
    }

    #[test]
    fn test_bool_format_and_parse() {
        assert_eq!(FieldKind::Bool.format(&FieldValue::Bool(true)), "Yes");
        assert_eq!(FieldKind::Bool.format(&FieldValue::Bool(false)), "No");
        assert_eq!(FieldKind::Bool.parse("yes").unwrap(), FieldValue::Bool(true));
        assert_eq!(FieldKind::Bool.parse("No").unwrap(), FieldValue::Bool(false));
        assert!(FieldKind::Bool.parse("maybe").is_err());
    }

    #[test]
    fn test_date_format_and_parse() {
        let t = NaiveDate::from_ymd_opt(2018, 1, 29)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let v = FieldValue::Date(Some(t));
        assert_eq!(FieldKind::Date.format(&v), "2018-01-29 08:00");
        assert_eq!(FieldKind::Date.parse("2018-01-29 08:00").unwrap(), v);
        assert_eq!(
            FieldKind::Date.parse("2018-01-29").unwrap(),
            FieldValue::Date(Some(
                NaiveDate::from_ymd_opt(2018, 1, 29)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            ))
        );
        assert_eq!(FieldKind::Date.parse("").unwrap(), FieldValue::Date(None));
        assert_eq!(FieldKind::Date.format(&FieldValue::Date(None)), "");
        assert!(FieldKind::Date.parse("Jan 29").is_err());
    }

    #[test]
    fn test_duration_kinds_share_the_duration_variant() {
        let v = FieldValue::Duration(Duration::days(2));
        assert!(v.matches(FieldKind::DurationDays));
        assert!(v.matches(FieldKind::WorkHours));
        assert!(!v.matches(FieldKind::Text));
        assert_eq!(FieldKind::DurationDays.format(&v), "2 days");
        assert_eq!(FieldKind::WorkHours.format(&v), "16 hrs");
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(FieldKind::Bool.suggestions(), &["Yes", "No"]);
        assert_eq!(FieldKind::Constraint.suggestions().len(), 4);
        assert!(FieldKind::Text.suggestions().is_empty());
    }
}
