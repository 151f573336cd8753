//! Status command for showing where data lives and how much there is.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use hermes_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    writeln!(writer, "Hermes status")?;
    writeln!(writer, "Database: {}", database_path.display())?;

    let count = db.count()?;
    let Some(span) = db.span()? else {
        writeln!(writer, "No taggings recorded.")?;
        return Ok(());
    };

    writeln!(writer, "Taggings: {count}")?;
    writeln!(writer, "Span: {span}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use hermes_core::{LogRecord, Tag, TimeInterval};
    use insta::assert_snapshot;

    #[test]
    fn status_command_outputs_totals() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("hermes.db");
        let mut db = Database::open(&db_path).unwrap();

        let start = "2025-01-01T00:00:00Z".parse().unwrap();
        let end = "2025-01-01T02:00:00Z".parse().unwrap();
        db.append(&[LogRecord::new(
            TimeInterval::new(start, end).unwrap(),
            vec![Tag::new("Tag A").unwrap(), Tag::new("Tag B").unwrap()],
        )])
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/hermes.db");
        assert_snapshot!(output, @r"
        Hermes status
        Database: [TEMP]/hermes.db
        Taggings: 2
        Span: 2025-01-01T00:00:00Z..2025-01-01T02:00:00Z
        ");
    }

    #[test]
    fn status_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Path::new("/data/hermes.db")).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Hermes status
        Database: /data/hermes.db
        No taggings recorded.
        ");
    }
}
