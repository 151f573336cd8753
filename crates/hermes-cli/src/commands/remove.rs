//! Remove command for deleting one tagging from the log.

use std::io::Write;

use anyhow::{Result, bail};
use hermes_db::Database;

use crate::commands::record::TaggingArgs;

pub fn run<W: Write>(writer: &mut W, db: &Database, args: &TaggingArgs) -> Result<()> {
    let (interval, tag) = args.parse()?;
    if !db.remove(&interval, &tag)? {
        bail!("no tagging {tag} at {interval}");
    }
    writeln!(writer, "Removed {tag} at {interval}")?;
    Ok(())
}
