//! Work contours: non-uniform distribution of work over an assignment.
//!
//! A [`WorkContour`] is an ordered list of segments addressed by
//! *zero-based work time*, the working minutes elapsed since the
//! assignment started (wall-clock gaps such as nights and weekends do
//! not appear on this axis). Each segment records the cumulative end
//! offset and the cumulative work through that offset, so a segment's
//! *units density* is the work increment divided by the span.
//!
//! Eight canned shapes are generated by spreading a fixed 20-bucket
//! relative-unit curve evenly across a requested extent. Range edits
//! split the straddled segments and mark the contour [`Contoured`];
//! after every edit, segments with equal density are coalesced and
//! trailing zero-work segments are trimmed.
//!
//! [`Contoured`]: ContourKind::Contoured

use serde::{Deserialize, Serialize};
use std::fmt;

use super::duration::Duration;

/// Densities closer than this count as equal when coalescing.
const DENSITY_EPS: f64 = 1e-9;

/// Work amounts closer than this count as equal, in minutes.
const WORK_EPS: f64 = 1e-6;

// ================================
// Contour kinds
// ================================

/// The shape of a work contour.
///
/// The first eight are canned curves; [`Contoured`] marks a contour
/// that has been hand-edited and no longer follows any canned curve.
///
/// [`Contoured`]: ContourKind::Contoured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContourKind {
    #[default]
    Flat,
    BackLoaded,
    FrontLoaded,
    DoublePeak,
    EarlyPeak,
    LatePeak,
    Bell,
    Turtle,
    Contoured,
}

impl ContourKind {
    /// Relative units per twentieth of the extent. [`Contoured`] has no
    /// curve of its own and falls back to the flat one.
    ///
    /// [`Contoured`]: ContourKind::Contoured
    fn weights(self) -> [u32; 20] {
        match self {
            Self::Flat | Self::Contoured => [100; 20],
            Self::BackLoaded => {
                expand([10, 15, 25, 50, 50, 75, 75, 100, 100, 100])
            }
            Self::FrontLoaded => {
                expand([100, 100, 100, 75, 75, 50, 50, 25, 15, 10])
            }
            Self::DoublePeak => {
                expand([25, 50, 100, 50, 25, 25, 50, 100, 50, 25])
            }
            Self::EarlyPeak => {
                expand([25, 50, 100, 100, 75, 50, 50, 25, 15, 10])
            }
            Self::LatePeak => {
                expand([10, 15, 25, 50, 50, 75, 100, 100, 50, 25])
            }
            Self::Bell => expand([10, 20, 40, 80, 100, 100, 80, 40, 20, 10]),
            Self::Turtle => {
                expand([25, 50, 75, 100, 100, 100, 100, 75, 50, 25])
            }
        }
    }

    fn identifier(self) -> &'static str {
        match self {
            Self::Flat => "Flat",
            Self::BackLoaded => "BackLoaded",
            Self::FrontLoaded => "FrontLoaded",
            Self::DoublePeak => "DoublePeak",
            Self::EarlyPeak => "EarlyPeak",
            Self::LatePeak => "LatePeak",
            Self::Bell => "Bell",
            Self::Turtle => "Turtle",
            Self::Contoured => "Contoured",
        }
    }
}

impl fmt::Display for ContourKind {
    /// Renders the identifier with a space before inner capitals, e.g.
    /// `Back Loaded`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.identifier().chars().enumerate() {
            if i > 0 && c.is_ascii_uppercase() {
                write!(f, " ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

fn expand(deciles: [u32; 10]) -> [u32; 20] {
    let mut buckets = [0; 20];
    for (i, d) in deciles.into_iter().enumerate() {
        buckets[2 * i] = d;
        buckets[2 * i + 1] = d;
    }
    buckets
}

// ================================
// Segments
// ================================

/// One constant-density run: cumulative end offset and cumulative work
/// through it, both on the work-time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSegment {
    end: i64,
    work: f64,
}

impl ContourSegment {
    /// Work-time offset at which the segment ends.
    pub fn end_offset(&self) -> Duration {
        Duration::from_minutes(self.end)
    }

    /// Total work through the end of this segment.
    pub fn work_to_end(&self) -> Duration {
        Duration::from_minutes_f64(self.work)
    }
}

/// A per-segment increment view, used while editing.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: i64,
    end: i64,
    work: f64,
}

impl Piece {
    fn density(&self) -> f64 {
        self.work / (self.end - self.start) as f64
    }
}

// ================================
// Work contour
// ================================

/// Work distributed over an assignment's working time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkContour {
    kind: ContourKind,
    segments: Vec<ContourSegment>,
}

impl WorkContour {
    /// A uniform contour: `total_work` spread evenly over `extent`.
    pub fn flat(total_work: Duration, extent: Duration) -> Self {
        Self::generate(ContourKind::Flat, total_work, extent)
    }

    /// Applies a canned curve: `total_work` spread over `extent` in the
    /// proportions of the kind's 20-bucket curve. A non-positive extent
    /// yields an empty contour.
    pub fn generate(kind: ContourKind, total_work: Duration, extent: Duration) -> Self {
        let extent_min = extent.as_minutes().max(0);
        let total_min = total_work.as_minutes().max(0) as f64;
        let weights = kind.weights();
        let weight_sum: f64 = weights.iter().map(|w| f64::from(*w)).sum();

        let mut segments: Vec<ContourSegment> = Vec::new();
        let mut cumulative = 0.0;
        for (i, w) in weights.iter().enumerate() {
            cumulative += f64::from(*w);
            let end = extent_min * (i as i64 + 1) / 20;
            if end == 0 {
                continue;
            }
            let work = total_min * cumulative / weight_sum;
            match segments.last_mut() {
                // Buckets collapsing onto one boundary merge forward.
                Some(last) if last.end == end => last.work = work,
                _ => segments.push(ContourSegment { end, work }),
            }
        }
        let mut contour = Self { kind, segments };
        contour.coalesce();
        contour
    }

    pub fn kind(&self) -> ContourKind {
        self.kind
    }

    pub fn is_contoured(&self) -> bool {
        self.kind == ContourKind::Contoured
    }

    pub fn segments(&self) -> &[ContourSegment] {
        &self.segments
    }

    /// Work-time extent of the contour.
    pub fn extent(&self) -> Duration {
        Duration::from_minutes(self.segments.last().map(|s| s.end).unwrap_or(0))
    }

    pub fn total_work(&self) -> Duration {
        Duration::from_minutes_f64(self.total_minutes())
    }

    fn total_minutes(&self) -> f64 {
        self.segments.last().map(|s| s.work).unwrap_or(0.0)
    }

    /// Units density at a work-time offset; zero outside the contour.
    pub fn units_at(&self, offset: Duration) -> f64 {
        let at = offset.as_minutes();
        if at < 0 {
            return 0.0;
        }
        let i = self.segments.partition_point(|s| s.end <= at);
        match self.segments.get(i) {
            Some(seg) => {
                let start = if i == 0 { 0 } else { self.segments[i - 1].end };
                let prev = if i == 0 { 0.0 } else { self.segments[i - 1].work };
                (seg.work - prev) / (seg.end - start) as f64
            }
            None => 0.0,
        }
    }

    /// Work inside `[from, to)`, apportioning partially covered
    /// segments linearly by their density.
    pub fn get_work(&self, from: Duration, to: Duration) -> Duration {
        let lo = from.as_minutes().max(0);
        let hi = to.as_minutes();
        if hi <= lo {
            return Duration::zero();
        }
        let mut total = 0.0;
        let mut i = self.segments.partition_point(|s| s.end <= lo);
        while let Some(seg) = self.segments.get(i) {
            let start = if i == 0 { 0 } else { self.segments[i - 1].end };
            if start >= hi {
                break;
            }
            let prev = if i == 0 { 0.0 } else { self.segments[i - 1].work };
            let a = lo.max(start);
            let b = hi.min(seg.end);
            total += (seg.work - prev) * (b - a) as f64 / (seg.end - start) as f64;
            i += 1;
        }
        Duration::from_minutes_f64(total)
    }

    /// Replaces the work inside `[from, to)` with `value`, splitting the
    /// straddled segments so the head and tail keep their densities. The
    /// result is marked [`ContourKind::Contoured`]. Editing past the
    /// current extent extends the contour with a zero-work gap.
    pub fn set_work(&self, from: Duration, to: Duration, value: Duration) -> Self {
        let lo = from.as_minutes().max(0);
        let hi = to.as_minutes();
        if hi <= lo {
            return self.clone();
        }
        let mut pieces: Vec<Piece> = Vec::new();
        for p in self.pieces() {
            let span = (p.end - p.start) as f64;
            if p.start < lo {
                let end = p.end.min(lo);
                pieces.push(Piece {
                    start: p.start,
                    end,
                    work: p.work * (end - p.start) as f64 / span,
                });
            }
            if p.end > hi {
                let start = p.start.max(hi);
                pieces.push(Piece {
                    start,
                    end: p.end,
                    work: p.work * (p.end - start) as f64 / span,
                });
            }
        }
        let current_end = self.segments.last().map(|s| s.end).unwrap_or(0);
        if lo > current_end {
            pieces.push(Piece {
                start: current_end,
                end: lo,
                work: 0.0,
            });
        }
        pieces.push(Piece {
            start: lo,
            end: hi,
            work: value.as_minutes().max(0) as f64,
        });
        pieces.sort_by_key(|p| p.start);
        Self::from_pieces(ContourKind::Contoured, pieces)
    }

    /// Retargets the total: growth appends a trailing segment at the
    /// final density (or uniform 100% units when the tail carries no
    /// work); shrinkage truncates from the tail, cutting the boundary
    /// segment at its own density.
    pub fn set_total_work(&self, value: Duration) -> Self {
        let target = value.as_minutes().max(0) as f64;
        let current = self.total_minutes();
        let mut pieces = self.pieces();
        if target > current + WORK_EPS {
            let density = pieces
                .last()
                .map(Piece::density)
                .filter(|d| *d > DENSITY_EPS)
                .unwrap_or(1.0);
            let start = pieces.last().map(|p| p.end).unwrap_or(0);
            let extra = target - current;
            let span = ((extra / density).round() as i64).max(1);
            pieces.push(Piece {
                start,
                end: start + span,
                work: extra,
            });
        } else if target < current - WORK_EPS {
            let mut surplus = current - target;
            while let Some(last) = pieces.last_mut() {
                if last.work <= surplus + WORK_EPS {
                    surplus -= last.work;
                    pieces.pop();
                } else {
                    let keep = last.work - surplus;
                    let span = ((keep / last.density()).round() as i64).max(1);
                    last.end = last.start + span;
                    last.work = keep;
                    break;
                }
            }
        } else {
            return self.clone();
        }
        let segments = build_segments(pieces);
        let kind = if segments.len() <= 1 {
            ContourKind::Flat
        } else {
            ContourKind::Contoured
        };
        Self { kind, segments }
    }

    fn pieces(&self) -> Vec<Piece> {
        let mut start = 0;
        let mut work = 0.0;
        self.segments
            .iter()
            .map(|s| {
                let p = Piece {
                    start,
                    end: s.end,
                    work: s.work - work,
                };
                start = s.end;
                work = s.work;
                p
            })
            .collect()
    }

    fn from_pieces(kind: ContourKind, pieces: Vec<Piece>) -> Self {
        Self {
            kind,
            segments: build_segments(pieces),
        }
    }

    /// Merges neighbors with equal density and drops trailing zero-work
    /// segments.
    fn coalesce(&mut self) {
        let pieces = self.pieces();
        self.segments = build_segments(pieces);
    }
}

fn build_segments(pieces: Vec<Piece>) -> Vec<ContourSegment> {
    let mut merged: Vec<Piece> = Vec::with_capacity(pieces.len());
    for p in pieces {
        if p.end <= p.start {
            continue;
        }
        match merged.last_mut() {
            Some(last) if (last.density() - p.density()).abs() < DENSITY_EPS => {
                last.end = p.end;
                last.work += p.work;
            }
            _ => merged.push(p),
        }
    }
    while matches!(merged.last(), Some(p) if p.work.abs() < WORK_EPS) {
        merged.pop();
    }
    let mut segments = Vec::with_capacity(merged.len());
    let mut work = 0.0;
    for p in merged {
        work += p.work;
        segments.push(ContourSegment { end: p.end, work });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(d: Duration) -> i64 {
        d.as_minutes()
    }

    #[test]
    fn test_flat_coalesces_to_one_segment() {
        let c = WorkContour::flat(Duration::hours(40), Duration::days(5));
        assert_eq!(c.segments().len(), 1);
        assert_eq!(c.total_work(), Duration::hours(40));
        assert_eq!(c.extent(), Duration::days(5));
        assert_eq!(c.kind(), ContourKind::Flat);
    }

    #[test]
    fn test_bell_coalesces_equal_densities() {
        // Equal-density neighbours merge: the doubled buckets collapse
        // pairwise and the two 100-weight deciles join into one run,
        // leaving nine runs of the curve 10 20 40 80 100 80 40 20 10.
        let c = WorkContour::generate(
            ContourKind::Bell,
            Duration::hours(44),
            Duration::days(10),
        );
        assert_eq!(c.segments().len(), 9);
        assert_eq!(c.total_work(), Duration::hours(44));
        assert_eq!(c.extent(), Duration::days(10));
    }

    #[test]
    fn test_bell_is_symmetric_and_centre_heavy() {
        let c = WorkContour::generate(
            ContourKind::Bell,
            Duration::hours(50),
            Duration::days(10),
        );
        let day = Duration::days(1);
        let first = c.get_work(Duration::zero(), day);
        let middle = c.get_work(Duration::days(4), Duration::days(5));
        let last = c.get_work(Duration::days(9), Duration::days(10));
        assert_eq!(first, last);
        assert!(middle > first);
        // Weights 10..100: the centre decile carries ten times the rim.
        assert_eq!(minutes(middle), minutes(first) * 10);
    }

    #[test]
    fn test_front_loaded_leans_forward() {
        let c = WorkContour::generate(
            ContourKind::FrontLoaded,
            Duration::hours(40),
            Duration::days(10),
        );
        let front = c.get_work(Duration::zero(), Duration::days(5));
        let back = c.get_work(Duration::days(5), Duration::days(10));
        assert!(front > back);
        assert_eq!(front + back, Duration::hours(40));
    }

    #[test]
    fn test_get_work_apportions_linearly() {
        let c = WorkContour::flat(Duration::hours(80), Duration::days(10));
        assert_eq!(
            c.get_work(Duration::zero(), Duration::days(10)),
            Duration::hours(80)
        );
        assert_eq!(
            c.get_work(Duration::days(2), Duration::days(3)),
            Duration::hours(8)
        );
        // Half a day inside one segment.
        assert_eq!(
            c.get_work(Duration::zero(), Duration::hours(4)),
            Duration::hours(4)
        );
        // Outside the extent there is no work.
        assert_eq!(
            c.get_work(Duration::days(10), Duration::days(12)),
            Duration::zero()
        );
    }

    #[test]
    fn test_units_at() {
        let c = WorkContour::flat(Duration::days(5), Duration::days(5));
        assert_eq!(c.units_at(Duration::days(2)), 1.0);
        assert_eq!(c.units_at(Duration::days(5)), 0.0);

        let half = WorkContour::flat(Duration::hours(20), Duration::days(5));
        assert_eq!(half.units_at(Duration::zero()), 0.5);
    }

    #[test]
    fn test_set_work_replaces_a_range() {
        let c = WorkContour::flat(Duration::hours(80), Duration::days(10));
        let edited = c.set_work(Duration::days(2), Duration::days(4), Duration::hours(4));
        assert!(edited.is_contoured());
        assert_eq!(
            edited.get_work(Duration::days(2), Duration::days(4)),
            Duration::hours(4)
        );
        // Head and tail keep their original work.
        assert_eq!(
            edited.get_work(Duration::zero(), Duration::days(2)),
            Duration::hours(16)
        );
        assert_eq!(
            edited.get_work(Duration::days(4), Duration::days(10)),
            Duration::hours(48)
        );
        assert_eq!(edited.total_work(), Duration::hours(68));
        assert_eq!(edited.extent(), Duration::days(10));
    }

    #[test]
    fn test_set_work_preserves_split_densities() {
        let c = WorkContour::generate(
            ContourKind::Bell,
            Duration::hours(44),
            Duration::days(10),
        );
        let before = c.units_at(Duration::hours(1));
        let tail_before = c.units_at(Duration::days(9) + Duration::hours(1));
        let edited = c.set_work(Duration::days(4), Duration::days(6), Duration::zero());
        assert_eq!(edited.units_at(Duration::hours(1)), before);
        assert_eq!(edited.units_at(Duration::days(9) + Duration::hours(1)), tail_before);
        assert_eq!(
            edited.get_work(Duration::days(4), Duration::days(6)),
            Duration::zero()
        );
    }

    #[test]
    fn test_set_work_matching_density_coalesces() {
        let c = WorkContour::flat(Duration::hours(80), Duration::days(10));
        // Rewriting two days with exactly their current work changes
        // nothing structural.
        let edited = c.set_work(Duration::days(2), Duration::days(4), Duration::hours(16));
        assert_eq!(edited.segments().len(), 1);
        assert_eq!(edited.total_work(), Duration::hours(80));
    }

    #[test]
    fn test_set_work_beyond_extent_leaves_a_gap() {
        let c = WorkContour::flat(Duration::hours(8), Duration::days(1));
        let edited = c.set_work(Duration::days(3), Duration::days(4), Duration::hours(8));
        assert_eq!(edited.extent(), Duration::days(4));
        assert_eq!(
            edited.get_work(Duration::days(1), Duration::days(3)),
            Duration::zero()
        );
        assert_eq!(edited.total_work(), Duration::hours(16));
    }

    #[test]
    fn test_trailing_zero_segments_are_trimmed() {
        let c = WorkContour::flat(Duration::hours(80), Duration::days(10));
        let edited = c.set_work(Duration::days(8), Duration::days(10), Duration::zero());
        assert_eq!(edited.extent(), Duration::days(8));
        assert_eq!(edited.total_work(), Duration::hours(64));
    }

    #[test]
    fn test_set_total_work_grows_at_tail_density() {
        let c = WorkContour::flat(Duration::hours(40), Duration::days(5));
        let grown = c.set_total_work(Duration::hours(56));
        assert_eq!(grown.total_work(), Duration::hours(56));
        // Flat tail density 1.0, so two extra days of extent.
        assert_eq!(grown.extent(), Duration::days(7));
        assert_eq!(grown.kind(), ContourKind::Flat);
    }

    #[test]
    fn test_set_total_work_shrinks_from_tail() {
        let c = WorkContour::generate(
            ContourKind::FrontLoaded,
            Duration::hours(40),
            Duration::days(10),
        );
        let shrunk = c.set_total_work(Duration::hours(10));
        assert_eq!(shrunk.total_work(), Duration::hours(10));
        assert!(shrunk.extent() < c.extent());
        // The untouched head is intact.
        assert_eq!(
            shrunk.get_work(Duration::zero(), Duration::days(1)),
            c.get_work(Duration::zero(), Duration::days(1))
        );
    }

    #[test]
    fn test_set_total_work_to_zero_empties() {
        let c = WorkContour::flat(Duration::hours(40), Duration::days(5));
        let empty = c.set_total_work(Duration::zero());
        assert_eq!(empty.total_work(), Duration::zero());
        assert_eq!(empty.extent(), Duration::zero());
        assert_eq!(empty.segments().len(), 0);
    }

    #[test]
    fn test_grow_from_empty_uses_full_units() {
        let empty = WorkContour::default();
        let grown = empty.set_total_work(Duration::hours(8));
        assert_eq!(grown.total_work(), Duration::hours(8));
        assert_eq!(grown.extent(), Duration::hours(8));
    }

    #[test]
    fn test_zero_extent_generates_empty() {
        let c = WorkContour::flat(Duration::hours(8), Duration::zero());
        assert_eq!(c.segments().len(), 0);
        assert_eq!(c.total_work(), Duration::zero());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ContourKind::BackLoaded.to_string(), "Back Loaded");
        assert_eq!(ContourKind::Flat.to_string(), "Flat");
        assert_eq!(ContourKind::DoublePeak.to_string(), "Double Peak");
    }
}
