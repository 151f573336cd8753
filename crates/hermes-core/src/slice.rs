//! Selection keys for [`TimeAccount::slice`](crate::TimeAccount::slice).
//!
//! Ordinal slices follow the familiar `start:stop:step` rules: omitted bounds
//! mean "from the beginning" / "to the end", negative bounds count from the
//! end, and a negative step walks backwards. All sign and clamping rules are
//! resolved in [`OrdinalSlice::indices`].

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use chrono::{DateTime, Utc};

use crate::error::AccountError;
use crate::interval::TimeInterval;

/// An ordinal `start:stop:step` selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrdinalSlice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl OrdinalSlice {
    pub const fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// `[:]`
    pub const fn full() -> Self {
        Self::new(None, None, None)
    }

    /// `[::-1]`
    pub const fn reversed() -> Self {
        Self::new(None, None, Some(-1))
    }

    #[must_use]
    pub const fn step_by(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    pub(crate) const fn is_backwards(&self) -> bool {
        matches!(self.step, Some(step) if step < 0)
    }

    /// Resolves the slice against a sequence of `len` items into the explicit
    /// list of selected positions, in selection order.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>, AccountError> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(AccountError::ZeroStep);
        }
        let len = isize::try_from(len).unwrap_or(isize::MAX);
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

        let clamp = |bound: isize| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };
        let start = self.start.map_or(if step > 0 { lower } else { upper }, clamp);
        let stop = self.stop.map_or(if step > 0 { upper } else { lower }, clamp);

        let mut picked = Vec::new();
        let mut cursor = start;
        while (step > 0 && cursor < stop) || (step < 0 && cursor > stop) {
            // cursor stays within [0, len) inside the loop
            picked.push(cursor.unsigned_abs());
            // stepping past either end of isize means past the end of the slice
            match cursor.checked_add(step) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        Ok(picked)
    }
}

/// Resolves a possibly negative single index against `len`.
///
/// Valid indices are the open range `(-len, len)`.
pub(crate) const fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let magnitude = index.unsigned_abs();
    if magnitude >= len {
        None
    } else if index >= 0 {
        Some(magnitude)
    } else {
        Some(len - magnitude)
    }
}

/// The three ways to select part of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKey {
    /// By position in the account's iteration order.
    Ordinal(OrdinalSlice),
    /// By time range.
    Temporal(TimeInterval),
    /// By a single point in time.
    Instant(DateTime<Utc>),
}

impl From<OrdinalSlice> for SliceKey {
    fn from(slice: OrdinalSlice) -> Self {
        Self::Ordinal(slice)
    }
}

impl From<RangeFull> for SliceKey {
    fn from(_: RangeFull) -> Self {
        Self::Ordinal(OrdinalSlice::full())
    }
}

impl From<Range<isize>> for SliceKey {
    fn from(range: Range<isize>) -> Self {
        Self::Ordinal(OrdinalSlice::new(Some(range.start), Some(range.end), None))
    }
}

impl From<RangeFrom<isize>> for SliceKey {
    fn from(range: RangeFrom<isize>) -> Self {
        Self::Ordinal(OrdinalSlice::new(Some(range.start), None, None))
    }
}

impl From<RangeTo<isize>> for SliceKey {
    fn from(range: RangeTo<isize>) -> Self {
        Self::Ordinal(OrdinalSlice::new(None, Some(range.end), None))
    }
}

impl From<TimeInterval> for SliceKey {
    fn from(interval: TimeInterval) -> Self {
        Self::Temporal(interval)
    }
}

impl From<DateTime<Utc>> for SliceKey {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Instant(at)
    }
}
