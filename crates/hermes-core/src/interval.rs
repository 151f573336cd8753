//! Closed time intervals.
//!
//! A [`TimeInterval`] is used both to place a tag on the timeline and to
//! query an account. Intervals are closed on both ends, so an interval whose
//! start equals its end is a single instant, and two intervals that merely
//! touch at an endpoint intersect.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A span of time from `start` to `end`, inclusive.
///
/// Ordering is by `start`, then by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Unvalidated wire form, so deserialization goes through [`TimeInterval::new`].
#[derive(Serialize, Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    /// Creates an interval, rejecting one that ends before it starts.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// A zero-width interval at `at`.
    #[must_use]
    pub const fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// The whole UTC day `date`, ending one microsecond before the next midnight.
    ///
    /// The last representable day ends at [`DateTime::<Utc>::MAX_UTC`].
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        let start = midnight(date);
        let end = start
            .checked_add_signed(Duration::days(1))
            .map_or(DateTime::<Utc>::MAX_UTC, |next| next - Duration::microseconds(1));
        Self { start, end }
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True for zero-width intervals.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    /// True if the two intervals share at least one instant.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True if `at` falls within this interval.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// True if this interval lies entirely within `other`.
    #[must_use]
    pub fn during(&self, other: &Self) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// The overlapping part of two intervals, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// The smallest interval covering both.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// True if this interval starts strictly before `other` does.
    #[must_use]
    pub fn before(&self, other: &Self) -> bool {
        self.start < other.start
    }

    /// True if this interval finishes strictly after `other` does.
    #[must_use]
    pub fn after(&self, other: &Self) -> bool {
        self.end > other.end
    }

    /// The UTC calendar days this interval touches before its end.
    ///
    /// A day whose midnight equals `end` is not included, so an interval
    /// ending exactly at midnight does not reach into the next day.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let (start, end) = (self.start, self.end);
        start
            .date_naive()
            .iter_days()
            .take_while(move |day| *day == start.date_naive() || midnight(*day) < end)
    }

    /// Splits the interval into contiguous pieces of `step`, clipping the last one.
    ///
    /// Adjacent pieces share their boundary instant. A zero-width interval
    /// yields no pieces.
    pub fn subintervals(&self, step: Duration) -> Result<Subintervals, ValidationError> {
        if step <= Duration::zero() {
            return Err(ValidationError::NonPositiveDuration(step));
        }
        Ok(Subintervals {
            cursor: self.start,
            end: self.end,
            step,
        })
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        if self.is_instant() {
            return write!(f, "{start}");
        }
        let end = self.end.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        write!(f, "{start}..{end}")
    }
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = ValidationError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(interval: TimeInterval) -> Self {
        Self {
            start: interval.start,
            end: interval.end,
        }
    }
}

/// Iterator returned by [`TimeInterval::subintervals`].
#[derive(Debug, Clone)]
pub struct Subintervals {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Iterator for Subintervals {
    type Item = TimeInterval;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let start = self.cursor;
        let finish = start
            .checked_add_signed(self.step)
            .map_or(self.end, |next| next.min(self.end));
        self.cursor = finish;
        Some(TimeInterval { start, end: finish })
    }
}
