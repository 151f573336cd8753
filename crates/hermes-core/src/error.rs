//! Error types for tags, intervals and accounts.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::interval::TimeInterval;

/// Validation errors raised while constructing core values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A tag was constructed without a usable name.
    #[error("tag name cannot be empty")]
    EmptyTagName,

    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An interval whose end precedes its start.
    #[error("interval ends at {end} before it starts at {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A category name that does not match [`CATEGORY_NAME_PATTERN`](crate::category::CATEGORY_NAME_PATTERN).
    #[error("category name {name:?} must match \"{pattern}\"")]
    InvalidCategory { name: String, pattern: &'static str },

    /// A `/`-separated category path with an empty segment.
    #[error("invalid category path: {path:?}")]
    InvalidCategoryPath { path: String },

    /// Interval subdivision requires a strictly positive step.
    #[error("duration must be positive, got {0}")]
    NonPositiveDuration(Duration),
}

/// Errors raised by [`TimeAccount`](crate::TimeAccount) queries and construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Single-index access outside `(-len, len)`.
    #[error("index {index} out of range for account of length {len}")]
    OutOfRange { index: isize, len: usize },

    /// An ordinal slice with a step of zero.
    #[error("slice step cannot be zero")]
    ZeroStep,

    /// A tagging recorded outside the bounded scope of the account being built.
    #[error("interval {interval} lies outside the account scope {scope}")]
    OutsideScope {
        interval: TimeInterval,
        scope: TimeInterval,
    },
}
