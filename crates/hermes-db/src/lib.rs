//! Storage layer for Hermes.
//!
//! Persists the tagging log in `SQLite` via `rusqlite` and replays it into
//! [`TimeAccount`] snapshots.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization. The accounts it loads are plain snapshots and can be shared freely.
//!
//! # Schema
//!
//! Every tag placed over an interval is one row in `taggings`. The `seq`
//! column records append order, which is the order replay uses, so taggings
//! that start at the same instant come back in the order they were written.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in fixed-width RFC 3339 with nanoseconds
//! (e.g., `2024-01-15T10:30:00.000000000Z`), so lexicographic ordering matches
//! chronological ordering, range filters can run in SQL, and every instant
//! a `DateTime<Utc>` can hold comes back unchanged.
//!
//! ## Optional Tag Fields
//!
//! A missing category or source is stored as the empty string rather than
//! NULL; `SQLite` treats NULLs as distinct in unique indexes, which would let
//! duplicate uncategorized taggings through.
//!
//! ## Tag Metadata
//!
//! Tag metadata is stored as a JSON object in `metadata`. It is not part of
//! the unique index: appending a tagging that differs only in metadata is
//! ignored, and the first stored metadata wins.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use hermes_core::{
    AccountError, Category, LogRecord, Tag, TimeAccount, TimeAccountBuilder, TimeInterval,
    ValidationError,
};
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in row {seq}: {timestamp}")]
    TimestampParse {
        seq: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Stored tag metadata is not a JSON object.
    #[error("invalid tag metadata in row {seq}")]
    Metadata {
        seq: i64,
        #[source]
        source: serde_json::Error,
    },
    /// A stored row (or a record being appended) does not form a valid tagging.
    #[error("invalid tagging: {0}")]
    Validation(#[from] ValidationError),
    /// Replaying the stored log failed.
    #[error("failed to rebuild account: {0}")]
    Account(#[from] AccountError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A `taggings` row before it is turned back into core types.
struct StoredTagging {
    seq: i64,
    valid_from: String,
    valid_to: String,
    name: String,
    category: String,
    source: String,
    metadata: String,
}

impl StoredTagging {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            valid_from: row.get(1)?,
            valid_to: row.get(2)?,
            name: row.get(3)?,
            category: row.get(4)?,
            source: row.get(5)?,
            metadata: row.get(6)?,
        })
    }

    fn interval(&self) -> Result<TimeInterval, DbError> {
        let start = parse_timestamp(&self.valid_from, self.seq)?;
        let end = parse_timestamp(&self.valid_to, self.seq)?;
        Ok(TimeInterval::new(start, end)?)
    }

    fn tag(&self) -> Result<Tag, DbError> {
        let mut builder = Tag::builder(self.name.as_str());
        if !self.category.is_empty() {
            builder = builder.category(self.category.parse::<Category>()?);
        }
        if !self.source.is_empty() {
            builder = builder.source(self.source.as_str());
        }
        let metadata =
            serde_json::from_str(&self.metadata).map_err(|source| DbError::Metadata {
                seq: self.seq,
                source,
            })?;
        Ok(builder.metadata(metadata).build()?)
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- taggings: one tag over one interval
            -- seq: append order, used to replay ties deterministically
            -- valid_from/valid_to: RFC 3339, nanosecond precision, UTC
            -- category: full category path, '' when uncategorized
            -- metadata: JSON object, not part of a tagging's identity
            CREATE TABLE IF NOT EXISTS taggings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                valid_from TEXT NOT NULL,
                valid_to TEXT NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT NOT NULL DEFAULT '{}'
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_taggings_unique
                ON taggings(valid_from, valid_to, name, category, source);
            CREATE INDEX IF NOT EXISTS idx_taggings_range ON taggings(valid_from, valid_to);
            ",
        )?;
        Ok(())
    }

    /// Appends records to the log, ignoring taggings that are already stored.
    ///
    /// All records are checked before anything is written, and the batch is
    /// written in a single transaction. Returns the number of new rows.
    pub fn append(&mut self, records: &[LogRecord]) -> Result<usize, DbError> {
        if records.iter().any(|record| record.tags.is_empty()) {
            return Err(ValidationError::Empty { field: "tags" }.into());
        }
        if records.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO taggings
                    (valid_from, valid_to, name, category, source, metadata)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for record in records {
                let valid_from = format_timestamp(record.interval.start());
                let valid_to = format_timestamp(record.interval.end());
                for tag in &record.tags {
                    inserted += stmt.execute(params![
                        valid_from,
                        valid_to,
                        tag.name(),
                        category_column(tag),
                        tag.source().unwrap_or_default(),
                        metadata_column(tag),
                    ])?;
                }
            }
        }
        tx.commit()?;
        tracing::debug!(records = records.len(), inserted, "appended taggings");
        Ok(inserted)
    }

    /// Removes one stored tagging. Returns `false` if it was not present.
    pub fn remove(&self, interval: &TimeInterval, tag: &Tag) -> Result<bool, DbError> {
        let deleted = self.conn.execute(
            "
            DELETE FROM taggings
            WHERE valid_from = ? AND valid_to = ? AND name = ? AND category = ? AND source = ?
            ",
            params![
                format_timestamp(interval.start()),
                format_timestamp(interval.end()),
                tag.name(),
                category_column(tag),
                tag.source().unwrap_or_default(),
            ],
        )?;
        tracing::debug!(%interval, tag = tag.name(), deleted, "removed tagging");
        Ok(deleted > 0)
    }

    /// Number of stored taggings.
    pub fn count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM taggings", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Replays the whole log into an unbounded account.
    pub fn load_account(&self) -> Result<TimeAccount, DbError> {
        let rows = self.query_taggings(
            "
            SELECT seq, valid_from, valid_to, name, category, source, metadata
            FROM taggings
            ORDER BY seq ASC
            ",
            [],
        )?;
        replay_rows(TimeAccountBuilder::new(), &rows)
    }

    /// Replays the taggings that intersect `interval` into an account scoped to it.
    ///
    /// Both ends are inclusive: a tagging that ends exactly at `interval.start()`
    /// is included.
    pub fn load_range(&self, interval: &TimeInterval) -> Result<TimeAccount, DbError> {
        let rows = self.query_taggings(
            "
            SELECT seq, valid_from, valid_to, name, category, source, metadata
            FROM taggings
            WHERE valid_from <= ?1 AND valid_to >= ?2
            ORDER BY seq ASC
            ",
            params![
                format_timestamp(interval.end()),
                format_timestamp(interval.start()),
            ],
        )?;
        replay_rows(TimeAccountBuilder::new().scope(*interval), &rows)
    }

    /// The earliest start and latest end over all stored taggings.
    pub fn span(&self) -> Result<Option<TimeInterval>, DbError> {
        let bounds: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT MIN(valid_from), MAX(valid_to) FROM taggings",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((Some(start), Some(end))) = bounds else {
            return Ok(None);
        };
        let start = parse_timestamp(&start, 0)?;
        let end = parse_timestamp(&end, 0)?;
        Ok(Some(TimeInterval::new(start, end)?))
    }

    fn query_taggings(
        &self,
        sql: &str,
        params: impl Params,
    ) -> Result<Vec<StoredTagging>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, StoredTagging::from_row)?;
        let mut taggings = Vec::new();
        for row in rows {
            taggings.push(row?);
        }
        Ok(taggings)
    }
}

fn replay_rows(
    mut builder: TimeAccountBuilder,
    rows: &[StoredTagging],
) -> Result<TimeAccount, DbError> {
    for row in rows {
        builder.record(row.interval()?, [row.tag()?])?;
    }
    let account = builder.build();
    tracing::debug!(rows = rows.len(), taggings = account.len(), "loaded account");
    Ok(account)
}

fn category_column(tag: &Tag) -> String {
    tag.category().map(Category::full_path).unwrap_or_default()
}

fn metadata_column(tag: &Tag) -> String {
    serde_json::Value::Object(tag.metadata().clone()).to_string()
}

fn parse_timestamp(timestamp: &str, seq: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            seq,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
