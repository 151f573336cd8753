//! Import command for appending JSONL log records to the local `SQLite` store.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use hermes_core::LogRecord;
use hermes_db::Database;

pub fn run<R: BufRead, W: Write>(reader: R, writer: &mut W, db: &mut Database) -> Result<usize> {
    let records = parse_records(reader)?;
    let inserted = db.append(&records)?;
    writeln!(
        writer,
        "Imported {} records ({inserted} new taggings)",
        records.len()
    )?;
    Ok(inserted)
}

fn parse_records<R: BufRead>(reader: R) -> Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: LogRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid record on line {}", idx + 1))?;
        if record.tags.is_empty() {
            anyhow::bail!("record on line {} has no tags", idx + 1);
        }
        records.push(record);
    }
    tracing::debug!(records = records.len(), "parsed import");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"
{"interval":{"start":"2018-04-16T06:43:15Z","end":"2018-04-16T07:43:15Z"},"tags":[{"name":"Tag A"}]}
{"interval":{"start":"2018-04-16T07:13:15Z","end":"2018-04-16T07:43:15Z"},"tags":[{"name":"Tag B","category":"Work"},{"name":"Tag C"}]}

{"interval":{"start":"2018-04-16T06:43:15Z","end":"2018-04-16T07:43:15Z"},"tags":[{"name":"Tag A"}]}
"#;

    #[test]
    fn imports_records_and_skips_blank_lines() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let inserted = run(LOG.as_bytes(), &mut output, &mut db).unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Imported 3 records (3 new taggings)\n"
        );
        let names: Vec<_> = db
            .load_account()
            .unwrap()
            .iter()
            .map(|tag| tag.name().to_string())
            .collect();
        assert_eq!(names, vec!["Tag A", "Tag B", "Tag C"]);
    }

    #[test]
    fn reports_the_offending_line() {
        let input = "{\"interval\":{\"start\":\"2018-04-16T06:43:15Z\",\"end\":\"2018-04-16T06:00:00Z\"},\"tags\":[{\"name\":\"x\"}]}\n";
        let err = parse_records(input.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "invalid record on line 1");
    }

    #[test]
    fn rejects_records_without_tags() {
        let input = "\n{\"interval\":{\"start\":\"2018-04-16T06:43:15Z\",\"end\":\"2018-04-16T06:43:15Z\"},\"tags\":[]}\n";
        let err = parse_records(input.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "record on line 2 has no tags");
    }
}
