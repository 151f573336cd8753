//! Time accounts: ordered, sliceable collections of tagged intervals.
//!
//! # Model
//!
//! An account stores *taggings* (an interval plus one tag) in chronological
//! order of their start instant. Taggings that start at the same instant keep
//! the order in which they were recorded; tags themselves are never compared
//! for ordering. Recording the same tag over the same interval twice yields a
//! single tagging, so [`TimeAccount::len`] counts distinct taggings.
//!
//! An account also carries a [`Scope`] (the time range it was built or sliced
//! over) and a view direction. Reversal flips the direction without touching
//! the storage, which is why `account.reversed()` and a `[::-1]` slice are
//! indistinguishable.
//!
//! # Snapshots
//!
//! A built account has no mutating methods. Every query returns a new
//! account that shares its tags with the source through [`Arc`]; recording
//! more data goes through [`TimeAccount::to_builder`] and produces a fresh
//! snapshot. Accounts are `Send + Sync` and may be read from many threads.

use std::collections::HashSet;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;
use std::slice;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::category::Category;
use crate::error::{AccountError, ValidationError};
use crate::interval::TimeInterval;
use crate::slice::{OrdinalSlice, SliceKey, resolve_index};
use crate::strategy::{Intersecting, SliceStrategy};
use crate::tag::Tag;

/// One tag placed over one interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tagging {
    interval: TimeInterval,
    tag: Arc<Tag>,
}

impl Tagging {
    pub fn new(interval: TimeInterval, tag: impl Into<Arc<Tag>>) -> Self {
        Self {
            interval,
            tag: tag.into(),
        }
    }

    pub const fn interval(&self) -> &TimeInterval {
        &self.interval
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The same tag over a different interval. The tag is shared, not copied.
    #[must_use]
    pub fn with_interval(&self, interval: TimeInterval) -> Self {
        Self {
            interval,
            tag: Arc::clone(&self.tag),
        }
    }
}

impl Serialize for Tagging {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct TaggingRef<'a> {
            interval: &'a TimeInterval,
            tag: &'a Tag,
        }

        TaggingRef {
            interval: &self.interval,
            tag: &self.tag,
        }
        .serialize(serializer)
    }
}

/// The range of time an account was constructed or sliced over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Unbounded,
    Bounded(TimeInterval),
}

impl Scope {
    pub const fn interval(&self) -> Option<TimeInterval> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(interval) => Some(*interval),
        }
    }

    /// True if `interval` overlaps this scope.
    pub fn admits(&self, interval: &TimeInterval) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Bounded(scope) => scope.intersects(interval),
        }
    }
}

/// A run of consecutive taggings that share an interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub interval: TimeInterval,
    pub tags: Vec<&'a Tag>,
}

/// An ordered, sliceable collection of tagged time intervals.
///
/// See the [module documentation](self) for the ordering and snapshot rules.
#[derive(Debug, Clone)]
pub struct TimeAccount {
    /// Chronological by start, stable for ties, no duplicates.
    taggings: Vec<Tagging>,
    /// Whether iteration runs from the back of `taggings`.
    reversed: bool,
    scope: Scope,
    strategy: Arc<dyn SliceStrategy>,
}

impl TimeAccount {
    /// An account with no taggings and an unbounded scope.
    pub fn empty() -> Self {
        TimeAccountBuilder::new().build()
    }

    /// An account with no taggings, scoped to `interval`.
    pub fn scoped(interval: TimeInterval) -> Self {
        TimeAccountBuilder::new().scope(interval).build()
    }

    pub fn builder() -> TimeAccountBuilder {
        TimeAccountBuilder::new()
    }

    /// A builder holding this account's taggings, scope and strategy.
    ///
    /// Building it yields a new snapshot in chronological order.
    pub fn to_builder(&self) -> TimeAccountBuilder {
        TimeAccountBuilder {
            scope: self.scope,
            taggings: self.taggings.clone(),
            strategy: Some(Arc::clone(&self.strategy)),
        }
    }

    /// Number of distinct taggings in this account.
    pub fn len(&self) -> usize {
        self.taggings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taggings.is_empty()
    }

    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// True if iteration runs in reverse chronological order.
    pub const fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Replaces the strategy used by temporal slices of this account.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl SliceStrategy + 'static) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Taggings in iteration order.
    pub fn taggings(&self) -> Taggings<'_> {
        Taggings {
            inner: self.taggings.iter(),
            reversed: self.reversed,
        }
    }

    /// Tags in iteration order (chronological unless the account is reversed).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.taggings(),
        }
    }

    /// The exact reverse of [`iter`](Self::iter), including ties.
    pub fn iter_reversed(&self) -> std::iter::Rev<Iter<'_>> {
        self.iter().rev()
    }

    /// Runs of consecutive taggings sharing an interval, in iteration order.
    pub fn entries(&self) -> Vec<Entry<'_>> {
        let mut entries: Vec<Entry<'_>> = Vec::new();
        for tagging in self.taggings() {
            match entries.last_mut() {
                Some(entry) if entry.interval == tagging.interval => {
                    entry.tags.push(tagging.tag());
                }
                _ => entries.push(Entry {
                    interval: tagging.interval,
                    tags: vec![tagging.tag()],
                }),
            }
        }
        entries
    }

    /// Maps a position in iteration order onto `self.taggings`.
    fn storage_index(&self, position: usize) -> usize {
        if self.reversed {
            self.taggings.len() - 1 - position
        } else {
            position
        }
    }

    /// The tag at `index` in iteration order; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<&Tag, AccountError> {
        let len = self.len();
        let position = resolve_index(index, len).ok_or(AccountError::OutOfRange { index, len })?;
        Ok(self.taggings[self.storage_index(position)].tag())
    }

    /// Selects part of the account by ordinal slice, time range, or instant.
    ///
    /// ```
    /// # use hermes_core::{OrdinalSlice, TimeAccount};
    /// let account = TimeAccount::empty();
    /// assert_eq!(account.slice(..).unwrap(), account);
    /// assert!(account.slice(OrdinalSlice::full().step_by(0)).is_err());
    /// ```
    pub fn slice(&self, key: impl Into<SliceKey>) -> Result<Self, AccountError> {
        match key.into() {
            SliceKey::Ordinal(slice) => self.slice_ordinal(slice),
            SliceKey::Temporal(interval) => Ok(self.slice_temporal(interval)),
            SliceKey::Instant(at) => Ok(self.slice_temporal(TimeInterval::instant(at))),
        }
    }

    fn slice_ordinal(&self, slice: OrdinalSlice) -> Result<Self, AccountError> {
        let positions = slice.indices(self.len())?;
        let reversed = self.reversed != slice.is_backwards();

        let mut picked: Vec<usize> = positions
            .into_iter()
            .map(|position| self.storage_index(position))
            .collect();
        if reversed {
            // a backwards walk over storage; restore chronological storage order
            picked.reverse();
        }

        Ok(Self {
            taggings: picked.into_iter().map(|i| self.taggings[i].clone()).collect(),
            reversed,
            scope: self.scope,
            strategy: Arc::clone(&self.strategy),
        })
    }

    fn slice_temporal(&self, query: TimeInterval) -> Self {
        let taggings = if self.scope.admits(&query) {
            normalize(self.strategy.rederive(&self.taggings, &query))
        } else {
            tracing::debug!(%query, "temporal query outside account scope");
            Vec::new()
        };
        tracing::trace!(%query, selected = taggings.len(), "temporal slice");

        Self {
            taggings,
            reversed: self.reversed,
            scope: Scope::Bounded(query),
            strategy: Arc::clone(&self.strategy),
        }
    }

    /// Temporal slice from raw instants.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AccountError> {
        let query = TimeInterval::new(start, end)?;
        Ok(self.slice_temporal(query))
    }

    /// Temporal slice from `start` to the end of the scope (or of the data).
    pub fn slice_from(&self, start: DateTime<Utc>) -> Self {
        let end = self.bounds().map_or(start, |bounds| bounds.end().max(start));
        self.slice_temporal(TimeInterval::instant(start).hull(&TimeInterval::instant(end)))
    }

    /// Temporal slice from the start of the scope (or of the data) to `end`.
    pub fn slice_until(&self, end: DateTime<Utc>) -> Self {
        let start = self.bounds().map_or(end, |bounds| bounds.start().min(end));
        self.slice_temporal(TimeInterval::instant(start).hull(&TimeInterval::instant(end)))
    }

    /// The scope if bounded, otherwise the span of the data.
    fn bounds(&self) -> Option<TimeInterval> {
        self.scope.interval().or_else(|| self.span())
    }

    /// An account whose iteration order is the exact reverse of this one.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            reversed: !self.reversed,
            ..self.clone()
        }
    }

    /// The smallest interval covering every tagging, if there are any.
    pub fn span(&self) -> Option<TimeInterval> {
        let first = self.taggings.first()?.interval;
        Some(
            self.taggings
                .iter()
                .fold(first, |hull, tagging| hull.hull(&tagging.interval)),
        )
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.iter().any(|candidate| candidate == tag)
    }

    /// Keeps only the taggings filed under `category` or its descendants.
    #[must_use]
    pub fn filter(&self, category: &Category) -> Self {
        Self {
            taggings: self
                .taggings
                .iter()
                .filter(|tagging| category.contains(tagging.tag()))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Temporal slices over consecutive `step`-long pieces of the scope (or of the data).
    pub fn subaccounts(&self, step: Duration) -> Result<Vec<Self>, AccountError> {
        let Some(bounds) = self.bounds() else {
            return Ok(Vec::new());
        };
        Ok(bounds
            .subintervals(step)?
            .map(|piece| self.slice_temporal(piece))
            .collect())
    }

    /// Merges several accounts into one chronological snapshot.
    ///
    /// The result is scoped to the hull of the inputs' scopes, or unbounded if
    /// any input is unbounded.
    pub fn combine<'a>(accounts: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut builder = TimeAccountBuilder::new();
        let mut scope: Option<Scope> = None;
        for account in accounts {
            builder.taggings.extend(account.taggings.iter().cloned());
            scope = Some(match (scope, account.scope) {
                (None, next) => next,
                (Some(Scope::Bounded(a)), Scope::Bounded(b)) => Scope::Bounded(a.hull(&b)),
                (Some(_), _) => Scope::Unbounded,
            });
        }
        builder.scope = scope.unwrap_or_default();
        builder.build()
    }
}

impl Default for TimeAccount {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for TimeAccount {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.taggings().eq(other.taggings())
    }
}

impl Eq for TimeAccount {}

impl Index<usize> for TimeAccount {
    type Output = Tag;

    fn index(&self, index: usize) -> &Tag {
        let len = self.len();
        assert!(
            index < len,
            "index out of range: the len is {len} but the index is {index}"
        );
        self.taggings[self.storage_index(index)].tag()
    }
}

impl<'a> IntoIterator for &'a TimeAccount {
    type Item = &'a Tag;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One line per tagging: `<interval>  <tag> [<category>]`.
impl fmt::Display for TimeAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tagging) in self.taggings().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}  {}", tagging.interval, tagging.tag)?;
            if let Some(category) = tagging.tag.category() {
                write!(f, " [{category}]")?;
            }
        }
        Ok(())
    }
}

impl Serialize for TimeAccount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct AccountRef<'a> {
            scope: Option<TimeInterval>,
            reversed: bool,
            taggings: Vec<&'a Tagging>,
        }

        AccountRef {
            scope: self.scope.interval(),
            reversed: self.reversed,
            taggings: self.taggings().collect(),
        }
        .serialize(serializer)
    }
}

/// Iterator over an account's taggings in iteration order.
#[derive(Debug, Clone)]
pub struct Taggings<'a> {
    inner: slice::Iter<'a, Tagging>,
    reversed: bool,
}

impl<'a> Iterator for Taggings<'a> {
    type Item = &'a Tagging;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reversed {
            self.inner.next_back()
        } else {
            self.inner.next()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Taggings<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.reversed {
            self.inner.next()
        } else {
            self.inner.next_back()
        }
    }
}

impl ExactSizeIterator for Taggings<'_> {}

impl FusedIterator for Taggings<'_> {}

/// Iterator over an account's tags, returned by [`TimeAccount::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: Taggings<'a>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Tag;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Tagging::tag)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Tagging::tag)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// Collects taggings into a new account snapshot.
///
/// This is the only way taggings enter an account; the log replay in
/// [`replay`](crate::replay()) and the storage layer both go through it.
#[derive(Debug, Clone, Default)]
pub struct TimeAccountBuilder {
    scope: Scope,
    taggings: Vec<Tagging>,
    strategy: Option<Arc<dyn SliceStrategy>>,
}

impl TimeAccountBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the account to `interval`; later records must intersect it.
    #[must_use]
    pub fn scope(mut self, interval: TimeInterval) -> Self {
        self.scope = Scope::Bounded(interval);
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: impl SliceStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Records `tags` over `interval`, after everything recorded so far.
    ///
    /// Nothing is recorded if the call fails.
    pub fn record(
        &mut self,
        interval: TimeInterval,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Result<(), AccountError> {
        if let Scope::Bounded(scope) = self.scope {
            if !scope.intersects(&interval) {
                return Err(AccountError::OutsideScope { interval, scope });
            }
        }
        let before = self.taggings.len();
        self.taggings
            .extend(tags.into_iter().map(|tag| Tagging::new(interval, tag)));
        if self.taggings.len() == before {
            return Err(ValidationError::Empty { field: "tags" }.into());
        }
        Ok(())
    }

    /// Number of taggings recorded so far, before duplicates collapse.
    pub fn pending(&self) -> usize {
        self.taggings.len()
    }

    /// Freezes the recorded taggings into an account.
    pub fn build(self) -> TimeAccount {
        let strategy: Arc<dyn SliceStrategy> = match self.strategy {
            Some(strategy) => strategy,
            None => Arc::new(Intersecting),
        };
        TimeAccount {
            taggings: normalize(self.taggings),
            reversed: false,
            scope: self.scope,
            strategy,
        }
    }
}

/// Drops repeated taggings (keeping the first) and stable-sorts by start.
fn normalize(mut taggings: Vec<Tagging>) -> Vec<Tagging> {
    let mut seen = HashSet::with_capacity(taggings.len());
    let before = taggings.len();
    taggings.retain(|tagging| seen.insert(tagging.clone()));
    if taggings.len() < before {
        tracing::trace!(collapsed = before - taggings.len(), "collapsed duplicate taggings");
    }
    taggings.sort_by_key(|tagging| tagging.interval.start());
    taggings
}
