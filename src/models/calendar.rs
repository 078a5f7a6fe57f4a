//! Work calendars and working-time arithmetic.
//!
//! A [`Calendar`] owns a [`WorkingWeek`] of seven [`WorkingDay`]s, each an
//! ordered list of non-overlapping [`WorkingTime`] intervals (offsets from
//! midnight). All duration and finish arithmetic runs in *working* time:
//! walking forward or backward through consecutive working intervals and
//! accumulating only the time inside them.
//!
//! # Edge policy
//! Intervals are half-open. A timestamp exactly at an interval start is
//! *inside* for forward snapping ([`Calendar::find_work_start`]) and
//! *outside* for backward snapping ([`Calendar::find_work_end`]); a
//! timestamp exactly at an interval end is the mirror image. A span that
//! exhausts exactly at an interval boundary lands on that boundary, so a
//! task worked to the end of a day finishes at 17:00, not at the next
//! morning's 08:00.
//!
//! A week with no working time at all makes every operation a no-op
//! (inputs are returned unchanged, measured work is zero); nothing loops
//! hunting for working time that cannot exist.

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use super::duration::Duration;

// ================================
// Working time intervals
// ================================

/// A half-open interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTime {
    /// Interval start (inclusive).
    start: NaiveTime,
    /// Interval end (exclusive).
    end: NaiveTime,
}

impl WorkingTime {
    /// Creates an interval; callers keep `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Length of the interval.
    #[inline]
    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whether a time-of-day falls within `[start, end)`.
    #[inline]
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time < self.end
    }
}

/// One day's working intervals, ordered by start. Empty means a day off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    times: Vec<WorkingTime>,
}

impl WorkingDay {
    /// A non-working day.
    pub fn off() -> Self {
        Self::default()
    }

    /// The standard working day: 08:00–12:00 and 13:00–17:00.
    pub fn standard() -> Self {
        Self::off()
            .with_time(clock(8), clock(12))
            .with_time(clock(13), clock(17))
    }

    /// Adds an interval, keeping the list ordered by start.
    pub fn with_time(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.times.push(WorkingTime::new(start, end));
        self.times.sort_by_key(|wt| wt.start);
        self
    }

    /// The ordered intervals.
    pub fn times(&self) -> &[WorkingTime] {
        &self.times
    }

    pub fn is_off(&self) -> bool {
        self.times.is_empty()
    }

    /// Total working time in the day.
    pub fn work(&self) -> TimeDelta {
        self.times
            .iter()
            .fold(TimeDelta::zero(), |acc, wt| acc + wt.span())
    }
}

/// Seven [`WorkingDay`]s, indexed by [`Weekday`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingWeek {
    days: [WorkingDay; 7],
}

impl WorkingWeek {
    /// A week with no working time.
    pub fn empty() -> Self {
        Self {
            days: Default::default(),
        }
    }

    /// The standard week: Monday through Friday, 08:00–12:00 and
    /// 13:00–17:00; weekends off.
    pub fn standard() -> Self {
        use Weekday::*;
        let mut week = Self::empty();
        for weekday in [Mon, Tue, Wed, Thu, Fri] {
            week = week.with_day(weekday, WorkingDay::standard());
        }
        week
    }

    /// Replaces one day's pattern.
    pub fn with_day(mut self, weekday: Weekday, day: WorkingDay) -> Self {
        self.days[weekday.num_days_from_monday() as usize] = day;
        self
    }

    pub fn day(&self, weekday: Weekday) -> &WorkingDay {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// Whether any day has any working interval.
    pub fn has_working_time(&self) -> bool {
        self.days.iter().any(|d| !d.is_off())
    }
}

impl Default for WorkingWeek {
    fn default() -> Self {
        Self::standard()
    }
}

// ================================
// Calendar
// ================================

/// A named work calendar with the five working-time operations.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use cpm_core::models::{Calendar, Duration};
///
/// let cal = Calendar::standard();
/// // Monday 2018-01-29, before working hours.
/// let t = NaiveDate::from_ymd_opt(2018, 1, 29).unwrap().and_hms_opt(0, 0, 0).unwrap();
///
/// let start = cal.find_work_start(t);
/// assert_eq!(start.to_string(), "2018-01-29 08:00:00");
///
/// // Ten 8-hour days later, skipping the intervening weekend.
/// let finish = cal.add_work(start, Duration::days(10));
/// assert_eq!(finish.to_string(), "2018-02-09 17:00:00");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    /// Calendar name; the key in the project's calendar set.
    name: String,
    week: WorkingWeek,
}

impl Calendar {
    pub fn new(name: impl Into<String>, week: WorkingWeek) -> Self {
        Self {
            name: name.into(),
            week,
        }
    }

    /// The default calendar: "Standard", Monday–Friday, 08:00–12:00 and
    /// 13:00–17:00.
    pub fn standard() -> Self {
        Self::new("Standard", WorkingWeek::standard())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn week(&self) -> &WorkingWeek {
        &self.week
    }

    /// Whether the instant falls inside a working interval (half-open).
    pub fn is_working_time(&self, t: NaiveDateTime) -> bool {
        self.week
            .day(t.weekday())
            .times()
            .iter()
            .any(|wt| wt.contains(t.time()))
    }

    /// Smallest `t' >= t` inside a working interval.
    ///
    /// An instant exactly at an interval start stays put; exactly at an
    /// interval end it moves to the next interval's start.
    pub fn find_work_start(&self, t: NaiveDateTime) -> NaiveDateTime {
        if !self.week.has_working_time() {
            return t;
        }
        let mut date = t.date();
        let mut floor = Some(t.time());
        loop {
            for wt in self.week.day(date.weekday()).times() {
                match floor {
                    None => return date.and_time(wt.start),
                    Some(f) if f < wt.end => return date.and_time(f.max(wt.start)),
                    Some(_) => {}
                }
            }
            date = match date.succ_opt() {
                Some(d) => d,
                None => return t,
            };
            floor = None;
        }
    }

    /// Largest `t' <= t` inside a working interval.
    ///
    /// An instant exactly at an interval end stays put; exactly at an
    /// interval start it moves back to the previous interval's end.
    pub fn find_work_end(&self, t: NaiveDateTime) -> NaiveDateTime {
        if !self.week.has_working_time() {
            return t;
        }
        let mut date = t.date();
        let mut cap = Some(t.time());
        loop {
            for wt in self.week.day(date.weekday()).times().iter().rev() {
                match cap {
                    None => return date.and_time(wt.end),
                    Some(c) if c > wt.start => return date.and_time(c.min(wt.end)),
                    Some(_) => {}
                }
            }
            date = match date.pred_opt() {
                Some(d) => d,
                None => return t,
            };
            cap = None;
        }
    }

    /// Walks forward from `t` until `work` working time has elapsed.
    ///
    /// Negative `work` delegates to [`Calendar::subtract_work`]; zero
    /// returns [`Calendar::find_work_start`] of `t`. A span exhausting
    /// exactly at an interval end lands on that end.
    pub fn add_work(&self, t: NaiveDateTime, work: Duration) -> NaiveDateTime {
        if work.as_minutes() < 0 {
            return self.subtract_work(t, -work);
        }
        if !self.week.has_working_time() {
            return t;
        }
        let origin = self.find_work_start(t);
        let mut remaining = work.to_delta();
        if remaining.is_zero() {
            return origin;
        }
        let mut date = origin.date();
        let mut floor = Some(origin.time());
        loop {
            for wt in self.week.day(date.weekday()).times() {
                let begin = match floor {
                    None => wt.start,
                    Some(f) if f >= wt.end => continue,
                    Some(f) => f.max(wt.start),
                };
                let available = wt.end - begin;
                if available >= remaining {
                    return date.and_time(begin) + remaining;
                }
                remaining = remaining - available;
            }
            date = match date.succ_opt() {
                Some(d) => d,
                None => return origin,
            };
            floor = None;
        }
    }

    /// Walks backward from `t` until `work` working time has elapsed.
    ///
    /// Negative `work` delegates to [`Calendar::add_work`]; zero returns
    /// [`Calendar::find_work_end`] of `t`. A span exhausting exactly at
    /// an interval start lands on that start.
    pub fn subtract_work(&self, t: NaiveDateTime, work: Duration) -> NaiveDateTime {
        if work.as_minutes() < 0 {
            return self.add_work(t, -work);
        }
        if !self.week.has_working_time() {
            return t;
        }
        let origin = self.find_work_end(t);
        let mut remaining = work.to_delta();
        if remaining.is_zero() {
            return origin;
        }
        let mut date = origin.date();
        let mut cap = Some(origin.time());
        loop {
            for wt in self.week.day(date.weekday()).times().iter().rev() {
                let end = match cap {
                    None => wt.end,
                    Some(c) if c <= wt.start => continue,
                    Some(c) => c.min(wt.end),
                };
                let available = end - wt.start;
                if available >= remaining {
                    return date.and_time(end) - remaining;
                }
                remaining = remaining - available;
            }
            date = match date.pred_opt() {
                Some(d) => d,
                None => return origin,
            };
            cap = None;
        }
    }

    /// Total working time between two instants.
    ///
    /// `from` is snapped forward and `to` backward before measuring, so
    /// non-working slack at either edge does not count. Reversed
    /// arguments measure negative: `get_work(b, a) == -get_work(a, b)`.
    pub fn get_work(&self, from: NaiveDateTime, to: NaiveDateTime) -> Duration {
        if to < from {
            return -self.get_work(to, from);
        }
        if !self.week.has_working_time() {
            return Duration::zero();
        }
        let lo = self.find_work_start(from);
        let hi = self.find_work_end(to);
        if hi <= lo {
            return Duration::zero();
        }
        let mut total = TimeDelta::zero();
        let mut date = lo.date();
        while date <= hi.date() {
            for wt in self.week.day(date.weekday()).times() {
                let begin = date.and_time(wt.start).max(lo);
                let end = date.and_time(wt.end).min(hi);
                if end > begin {
                    total = total + (end - begin);
                }
            }
            date = match date.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }
        Duration::from_delta(total)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::standard()
    }
}

fn clock(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}
