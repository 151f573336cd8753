//! Rebuilding accounts from an append-only log.

use serde::{Deserialize, Serialize};

use crate::account::{TimeAccount, TimeAccountBuilder};
use crate::error::AccountError;
use crate::interval::TimeInterval;
use crate::tag::Tag;

/// One appended log entry: a set of tags placed over an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub interval: TimeInterval,
    pub tags: Vec<Tag>,
}

impl LogRecord {
    pub const fn new(interval: TimeInterval, tags: Vec<Tag>) -> Self {
        Self { interval, tags }
    }

    pub fn single(interval: TimeInterval, tag: Tag) -> Self {
        Self::new(interval, vec![tag])
    }
}

/// Builds an account by applying `records` strictly in log order.
///
/// Records sharing a start instant keep their log order in the result.
pub fn replay(records: impl IntoIterator<Item = LogRecord>) -> Result<TimeAccount, AccountError> {
    apply(TimeAccountBuilder::new(), records)
}

/// Builds a new snapshot holding `account` followed by `records`.
///
/// `account` itself is left untouched.
pub fn replay_onto(
    account: &TimeAccount,
    records: impl IntoIterator<Item = LogRecord>,
) -> Result<TimeAccount, AccountError> {
    apply(account.to_builder(), records)
}

fn apply(
    mut builder: TimeAccountBuilder,
    records: impl IntoIterator<Item = LogRecord>,
) -> Result<TimeAccount, AccountError> {
    let mut count = 0_usize;
    for record in records {
        builder.record(record.interval, record.tags)?;
        count += 1;
    }
    let account = builder.build();
    tracing::debug!(records = count, taggings = account.len(), "replayed log");
    Ok(account)
}
