//! Re-derivation strategies for temporal slices.
//!
//! A temporal slice is not required to be a sub-list of its source: the
//! strategy may synthesize taggings that are more specific to the query
//! interval. Strategies are pure functions of `(source, query)`.

use std::fmt;

use crate::account::Tagging;
use crate::interval::TimeInterval;

/// Derives the taggings of a temporal slice.
pub trait SliceStrategy: fmt::Debug + Send + Sync {
    /// `source` is in chronological order (stable for equal starts).
    ///
    /// The output does not need to be sorted or deduplicated; the account
    /// normalizes it.
    fn rederive(&self, source: &[Tagging], query: &TimeInterval) -> Vec<Tagging>;
}

/// Keeps every tagging whose interval intersects the query, unmodified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intersecting;

impl SliceStrategy for Intersecting {
    fn rederive(&self, source: &[Tagging], query: &TimeInterval) -> Vec<Tagging> {
        intersecting(source, query).cloned().collect()
    }
}

/// Keeps every intersecting tagging, trimmed to the query interval.
///
/// Two taggings of the same tag that trim down to the same interval collapse
/// into one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clipped;

impl SliceStrategy for Clipped {
    fn rederive(&self, source: &[Tagging], query: &TimeInterval) -> Vec<Tagging> {
        intersecting(source, query)
            .filter_map(|tagging| {
                let clipped = tagging.interval().intersection(query)?;
                Some(tagging.with_interval(clipped))
            })
            .collect()
    }
}

fn intersecting<'a>(
    source: &'a [Tagging],
    query: &'a TimeInterval,
) -> impl Iterator<Item = &'a Tagging> {
    // sorted by start, so nothing past the query end can intersect
    source
        .iter()
        .take_while(|tagging| tagging.interval().start() <= query.end())
        .filter(|tagging| tagging.interval().intersects(query))
}
