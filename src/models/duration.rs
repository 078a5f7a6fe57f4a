//! Working-time durations and their text forms.
//!
//! A [`Duration`] is a span of *working* minutes — calendar gaps such as
//! nights and weekends are excluded — plus an `estimated` marker rendered
//! as a trailing `?`. Unit conversions use the standard accounting of
//! 8 working hours per day and 5 working days per week.
//!
//! Task durations display in days (`"10 days"`), work amounts in hours
//! (`"40 hrs"`); both parse all unit aliases regardless of display unit.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedError};

/// Working minutes in one hour.
pub const MINUTES_PER_HOUR: i64 = 60;
/// Working minutes in one day (8-hour working day).
pub const MINUTES_PER_DAY: i64 = 8 * MINUTES_PER_HOUR;
/// Working minutes in one week (5-day working week).
pub const MINUTES_PER_WEEK: i64 = 5 * MINUTES_PER_DAY;

// ================================
// Duration
// ================================

/// A span of working time in whole minutes.
///
/// # Examples
///
/// ```
/// use cpm_core::models::Duration;
///
/// let d = Duration::days(10);
/// assert_eq!(d.as_minutes(), 4800);
/// assert_eq!(d.format_days(), "10 days");
///
/// let w: Duration = "16h".parse().unwrap();
/// assert_eq!(w, Duration::hours(16));
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Duration {
    minutes: i64,
    estimated: bool,
}

impl Duration {
    /// A zero-length span.
    pub const fn zero() -> Self {
        Self {
            minutes: 0,
            estimated: false,
        }
    }

    /// Creates a span of whole working minutes.
    pub const fn from_minutes(minutes: i64) -> Self {
        Self {
            minutes,
            estimated: false,
        }
    }

    /// Creates a span of fractional minutes, rounded half away from zero.
    pub fn from_minutes_f64(minutes: f64) -> Self {
        Self::from_minutes(minutes.round() as i64)
    }

    /// Creates a span of working hours.
    pub const fn hours(hours: i64) -> Self {
        Self::from_minutes(hours * MINUTES_PER_HOUR)
    }

    /// Creates a span of working days (8 hours each).
    pub const fn days(days: i64) -> Self {
        Self::from_minutes(days * MINUTES_PER_DAY)
    }

    /// Creates a span of working weeks (5 days each).
    pub const fn weeks(weeks: i64) -> Self {
        Self::from_minutes(weeks * MINUTES_PER_WEEK)
    }

    /// Returns the same span with the estimated marker set or cleared.
    pub const fn with_estimated(self, estimated: bool) -> Self {
        Self { estimated, ..self }
    }

    /// Whole working minutes in the span.
    pub const fn as_minutes(&self) -> i64 {
        self.minutes
    }

    /// The span in fractional working hours.
    pub fn as_hours_f64(&self) -> f64 {
        self.minutes as f64 / MINUTES_PER_HOUR as f64
    }

    /// The span in fractional working days.
    pub fn as_days_f64(&self) -> f64 {
        self.minutes as f64 / MINUTES_PER_DAY as f64
    }

    pub const fn is_zero(&self) -> bool {
        self.minutes == 0
    }

    /// Whether the trailing `?` marker applies.
    pub const fn is_estimated(&self) -> bool {
        self.estimated
    }

    /// Scales the span by a factor, rounding half away from zero.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            minutes: (self.minutes as f64 * factor).round() as i64,
            estimated: self.estimated,
        }
    }

    /// Converts to a calendar delta of the same number of minutes.
    pub fn to_delta(self) -> TimeDelta {
        TimeDelta::minutes(self.minutes)
    }

    /// Converts from a calendar delta, rounding seconds half away from zero.
    pub fn from_delta(delta: TimeDelta) -> Self {
        let secs = delta.num_seconds();
        let half = if secs >= 0 { 30 } else { -30 };
        Self::from_minutes((secs + half) / 60)
    }

    /// Renders in days: `"10 days"`, `"1.5 days"`, `"8 days?"`.
    pub fn format_days(&self) -> String {
        format_in_unit(self.minutes, self.estimated, DurationUnit::Days)
    }

    /// Renders in hours: `"40 hrs"`, `"1 hr"`, `"8 hrs?"`.
    pub fn format_hours(&self) -> String {
        format_in_unit(self.minutes, self.estimated, DurationUnit::Hours)
    }

    /// Parses duration text, using `default_unit` for a bare number.
    ///
    /// Accepted unit aliases (case-insensitive, optional space before the
    /// unit): `m`/`min`/`mins`/`minute`/`minutes`, `h`/`hr`/`hrs`/`hour`/
    /// `hours`, `d`/`day`/`days`, `w`/`wk`/`wks`/`week`/`weeks`. A
    /// trailing `?` marks the value estimated.
    pub fn parse(text: &str, default_unit: DurationUnit) -> Result<Self> {
        let trimmed = text.trim();
        let err = || SchedError::parse("duration", text);

        let (body, estimated) = match trimmed.strip_suffix('?') {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };
        if body.is_empty() {
            return Err(err());
        }

        let digits_end = body
            .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+')
            .unwrap_or(body.len());
        let (number, unit_text) = body.split_at(digits_end);
        let magnitude: f64 = number.trim().parse().map_err(|_| err())?;
        if !magnitude.is_finite() {
            return Err(err());
        }
        let unit = match unit_text.trim() {
            "" => default_unit,
            u => DurationUnit::from_alias(u).ok_or_else(err)?,
        };

        Ok(Self::from_minutes_f64(magnitude * unit.minutes() as f64).with_estimated(estimated))
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration {
            minutes: self.minutes + rhs.minutes,
            estimated: self.estimated || rhs.estimated,
        }
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration {
            minutes: self.minutes - rhs.minutes,
            estimated: self.estimated || rhs.estimated,
        }
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration {
            minutes: -self.minutes,
            estimated: self.estimated,
        }
    }
}

impl FromStr for Duration {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, DurationUnit::Days)
    }
}

// ================================
// Units
// ================================

/// Text units accepted by the duration parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl DurationUnit {
    /// Working minutes in one unit.
    pub const fn minutes(self) -> i64 {
        match self {
            DurationUnit::Minutes => 1,
            DurationUnit::Hours => MINUTES_PER_HOUR,
            DurationUnit::Days => MINUTES_PER_DAY,
            DurationUnit::Weeks => MINUTES_PER_WEEK,
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        match alias.to_ascii_lowercase().as_str() {
            "m" | "min" | "mins" | "minute" | "minutes" => Some(DurationUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(DurationUnit::Hours),
            "d" | "day" | "days" => Some(DurationUnit::Days),
            "w" | "wk" | "wks" | "week" | "weeks" => Some(DurationUnit::Weeks),
            _ => None,
        }
    }

    /// Unit label, singular or plural to match the magnitude.
    fn label(self, singular: bool) -> &'static str {
        match (self, singular) {
            (DurationUnit::Minutes, true) => "min",
            (DurationUnit::Minutes, false) => "mins",
            (DurationUnit::Hours, true) => "hr",
            (DurationUnit::Hours, false) => "hrs",
            (DurationUnit::Days, true) => "day",
            (DurationUnit::Days, false) => "days",
            (DurationUnit::Weeks, true) => "wk",
            (DurationUnit::Weeks, false) => "wks",
        }
    }
}

fn format_in_unit(minutes: i64, estimated: bool, unit: DurationUnit) -> String {
    let magnitude = minutes as f64 / unit.minutes() as f64;
    let number = trim_decimals(magnitude);
    let label = unit.label(number == "1" || number == "-1");
    let marker = if estimated { "?" } else { "" };
    format!("{number} {label}{marker}")
}

/// Renders with up to two decimals, trailing zeros trimmed.
fn trim_decimals(value: f64) -> String {
    let mut s = format!("{value:.2}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_days())
    }
}
