//! Record command for appending one tagging to the log.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use hermes_core::{LogRecord, Tag, TimeInterval};
use hermes_db::Database;

use crate::commands::util::{build_tag, parse_interval};

/// A tag over an interval, as given on the command line.
#[derive(Debug, Args)]
pub struct TaggingArgs {
    /// Tag name.
    #[arg(long)]
    pub name: String,

    /// Start of the interval (RFC 3339, YYYY-MM-DD, "now" or e.g. "2 hours ago").
    #[arg(long)]
    pub start: String,

    /// End of the interval; omit for an instant.
    #[arg(long)]
    pub end: Option<String>,

    /// Category path, e.g. "Work/Meetings".
    #[arg(long)]
    pub category: Option<String>,

    /// Where the tag came from.
    #[arg(long)]
    pub source: Option<String>,
}

impl TaggingArgs {
    pub fn parse(&self) -> Result<(TimeInterval, Tag)> {
        let interval = parse_interval(&self.start, self.end.as_deref())?;
        let tag = build_tag(
            &self.name,
            self.category.as_deref(),
            self.source.as_deref(),
        )?;
        Ok((interval, tag))
    }
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, args: &TaggingArgs) -> Result<()> {
    let (interval, tag) = args.parse()?;
    let inserted = db.append(&[LogRecord::single(interval, tag.clone())])?;
    if inserted == 0 {
        writeln!(writer, "Already recorded: {tag} at {interval}")?;
    } else {
        writeln!(writer, "Recorded {tag} at {interval}")?;
    }
    Ok(())
}
