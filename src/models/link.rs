//! Precedence links between tasks and their text form.
//!
//! A [`TaskLink`] is a directed edge from a predecessor task to a
//! successor task with one of four [`LinkType`]s and an optional lag.
//! Links are stored redundantly on both endpoints — a predecessor-link
//! list on the successor and a successor-link list on the predecessor,
//! each ordered by the *other* endpoint's ordinal — so either direction
//! iterates without an index structure.
//!
//! The text form (`"0FS+1 day"`, `"0,1FS+2 days"`) references tasks by
//! ordinal; [`PredecessorEntry`] is the parsed, project-independent
//! shape of one list element.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::duration::{Duration, DurationUnit};
use super::ident::TaskId;
use crate::error::{Result, SchedError};

// ================================
// Link types
// ================================

/// Dependency timing relation, by 2-letter code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Successor starts after the predecessor finishes (`FS`).
    #[default]
    FinishToStart,
    /// Successor starts with the predecessor (`SS`).
    StartToStart,
    /// Successor finishes with the predecessor (`FF`).
    FinishToFinish,
    /// Successor finishes when the predecessor starts (`SF`).
    StartToFinish,
}

impl LinkType {
    /// The 2-letter text code.
    pub const fn code(self) -> &'static str {
        match self {
            LinkType::FinishToStart => "FS",
            LinkType::StartToStart => "SS",
            LinkType::FinishToFinish => "FF",
            LinkType::StartToFinish => "SF",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "FS" => Some(LinkType::FinishToStart),
            "SS" => Some(LinkType::StartToStart),
            "FF" => Some(LinkType::FinishToFinish),
            "SF" => Some(LinkType::StartToFinish),
            _ => None,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LinkType {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s.trim()).ok_or_else(|| SchedError::parse("link type", s))
    }
}

// ================================
// Task links
// ================================

/// A directed precedence edge between two tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    pub predecessor: TaskId,
    pub successor: TaskId,
    pub link_type: LinkType,
    /// Working-time offset applied on top of the relation.
    pub lag: Duration,
}

impl TaskLink {
    pub fn new(predecessor: TaskId, successor: TaskId, link_type: LinkType, lag: Duration) -> Self {
        Self {
            predecessor,
            successor,
            link_type,
            lag,
        }
    }

    /// A plain finish-to-start link with no lag.
    pub fn finish_to_start(predecessor: TaskId, successor: TaskId) -> Self {
        Self::new(predecessor, successor, LinkType::default(), Duration::zero())
    }
}

// ================================
// Predecessor text entries
// ================================

/// One element of a predecessor list, addressed by task ordinal.
///
/// Text form: `<ordinal><link-type><±lag>`. A finish-to-start link with
/// zero lag renders as the bare ordinal; any other link type always
/// carries its code; a non-zero lag renders as `+N day(s)`/`-N day(s)`
/// and forces the code even for finish-to-start (so `"0FS+1 day"`
/// round-trips unchanged).
///
/// # Examples
///
/// ```
/// use cpm_core::models::{Duration, LinkType, PredecessorEntry};
///
/// let entry: PredecessorEntry = "0FS+1 day".parse().unwrap();
/// assert_eq!(entry.ordinal, 0);
/// assert_eq!(entry.link_type, LinkType::FinishToStart);
/// assert_eq!(entry.lag, Duration::days(1));
/// assert_eq!(entry.to_string(), "0FS+1 day");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredecessorEntry {
    pub ordinal: usize,
    pub link_type: LinkType,
    pub lag: Duration,
}

impl PredecessorEntry {
    pub fn new(ordinal: usize, link_type: LinkType, lag: Duration) -> Self {
        Self {
            ordinal,
            link_type,
            lag,
        }
    }

    /// A bare finish-to-start reference.
    pub fn plain(ordinal: usize) -> Self {
        Self::new(ordinal, LinkType::default(), Duration::zero())
    }

    /// Parses a comma-separated predecessor list; empty text is empty.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        trimmed.split(',').map(|entry| entry.parse()).collect()
    }

    /// Joins entries into list text, ordered by ordinal.
    pub fn format_list(entries: &[Self]) -> String {
        let mut sorted: Vec<&Self> = entries.iter().collect();
        sorted.sort_by_key(|e| e.ordinal);
        sorted
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for PredecessorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.link_type == LinkType::FinishToStart && self.lag.is_zero() {
            return write!(f, "{}", self.ordinal);
        }
        write!(f, "{}{}", self.ordinal, self.link_type.code())?;
        if !self.lag.is_zero() {
            let negative = self.lag.as_minutes() < 0;
            let sign = if negative { "-" } else { "+" };
            let magnitude = if negative { -self.lag } else { self.lag };
            write!(f, "{sign}{}", magnitude.format_days())?;
        }
        Ok(())
    }
}

impl FromStr for PredecessorEntry {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self> {
        let err = || SchedError::parse("predecessor entry", s);
        let body = s.trim();

        let digits_end = body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(body.len());
        if digits_end == 0 {
            return Err(err());
        }
        let ordinal: usize = body[..digits_end].parse().map_err(|_| err())?;
        let rest = &body[digits_end..];

        let code_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let link_type = match code_end {
            0 => LinkType::default(),
            _ => LinkType::from_code(&rest[..code_end]).ok_or_else(err)?,
        };

        let lag_text = rest[code_end..].trim();
        let lag = if lag_text.is_empty() {
            Duration::zero()
        } else if lag_text.starts_with('+') || lag_text.starts_with('-') {
            Duration::parse(lag_text, DurationUnit::Days).map_err(|_| err())?
        } else {
            return Err(err());
        };

        Ok(Self::new(ordinal, link_type, lag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_type_codes() {
        assert_eq!(LinkType::FinishToStart.code(), "FS");
        assert_eq!("ss".parse::<LinkType>().unwrap(), LinkType::StartToStart);
        assert!("XX".parse::<LinkType>().is_err());
    }

    #[test]
    fn test_entry_roundtrip_with_lag_keeps_code() {
        let entry: PredecessorEntry = "0FS+1 day".parse().unwrap();
        assert_eq!(entry, PredecessorEntry::new(0, LinkType::FinishToStart, Duration::days(1)));
        assert_eq!(entry.to_string(), "0FS+1 day");
    }

    #[test]
    fn test_entry_plain_fs_renders_bare_ordinal() {
        assert_eq!(PredecessorEntry::plain(3).to_string(), "3");
        assert_eq!("3".parse::<PredecessorEntry>().unwrap(), PredecessorEntry::plain(3));
    }

    #[test]
    fn test_entry_other_types() {
        let ss: PredecessorEntry = "2SS".parse().unwrap();
        assert_eq!(ss.link_type, LinkType::StartToStart);
        assert!(ss.lag.is_zero());
        assert_eq!(ss.to_string(), "2SS");

        let ff: PredecessorEntry = "4FF-1 day".parse().unwrap();
        assert_eq!(ff.lag, Duration::days(-1));
        assert_eq!(ff.to_string(), "4FF-1 day");
    }

    #[test]
    fn test_entry_plural_lag() {
        let entry = PredecessorEntry::new(1, LinkType::FinishToStart, Duration::days(2));
        assert_eq!(entry.to_string(), "1FS+2 days");
    }

    #[test]
    fn test_list_roundtrip() {
        let entries = PredecessorEntry::parse_list("0,1FS+2 days").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(PredecessorEntry::format_list(&entries), "0,1FS+2 days");
    }

    #[test]
    fn test_list_orders_by_ordinal() {
        let entries = vec![PredecessorEntry::plain(5), PredecessorEntry::plain(1)];
        assert_eq!(PredecessorEntry::format_list(&entries), "1,5");
    }

    #[test]
    fn test_empty_list() {
        assert!(PredecessorEntry::parse_list("  ").unwrap().is_empty());
        assert_eq!(PredecessorEntry::format_list(&[]), "");
    }

    #[test]
    fn test_entry_rejects_garbage() {
        for text in ["", "FS", "1XX", "1FS*2 days", "1FS+", "one"] {
            assert!(text.parse::<PredecessorEntry>().is_err(), "{text}");
        }
    }
}
