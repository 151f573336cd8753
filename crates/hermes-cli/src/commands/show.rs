//! Show command for printing the timeline or a slice of it.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hermes_core::{Category, Clipped, TimeAccount};
use hermes_db::Database;

use crate::Config;
use crate::commands::util::parse_datetime;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Only taggings that end at or after this time.
    #[arg(long, conflicts_with = "at")]
    pub from: Option<String>,

    /// Only taggings that start at or before this time.
    #[arg(long, conflicts_with = "at")]
    pub to: Option<String>,

    /// Only taggings covering this instant.
    #[arg(long)]
    pub at: Option<String>,

    /// Only taggings filed under this category path (or below it).
    #[arg(long)]
    pub category: Option<String>,

    /// Newest first.
    #[arg(long)]
    pub reverse: bool,

    /// Print only the tag at this position; negative counts from the end.
    #[arg(long, allow_hyphen_values = true)]
    pub index: Option<isize>,

    /// Trim taggings to the queried time range.
    #[arg(long)]
    pub clip: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, args: &ShowArgs) -> Result<()> {
    let account = select(db.load_account()?, config, args)?;

    if let Some(index) = args.index {
        let tag = account
            .get(index)
            .with_context(|| format!("no tag at index {index}"))?;
        if args.json {
            writeln!(writer, "{}", serde_json::to_string_pretty(tag)?)?;
        } else {
            writeln!(writer, "{tag}")?;
        }
        return Ok(());
    }

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&account)?)?;
    } else if account.is_empty() {
        writeln!(writer, "No taggings.")?;
    } else {
        writeln!(writer, "{account}")?;
    }
    Ok(())
}

/// Applies the time window, category filter and direction from `args`.
fn select(account: TimeAccount, config: &Config, args: &ShowArgs) -> Result<TimeAccount> {
    let account = if args.clip || config.clip_slices {
        account.with_strategy(Clipped)
    } else {
        account
    };

    let from = args.from.as_deref().map(parse_datetime).transpose().context("invalid --from")?;
    let to = args.to.as_deref().map(parse_datetime).transpose().context("invalid --to")?;
    let at = args.at.as_deref().map(parse_datetime).transpose().context("invalid --at")?;

    let mut account = match (at, from, to) {
        (Some(at), _, _) => account.slice(at)?,
        (None, Some(from), Some(to)) => account.between(from, to)?,
        (None, Some(from), None) => account.slice_from(from),
        (None, None, Some(to)) => account.slice_until(to),
        (None, None, None) => account,
    };
    tracing::debug!(taggings = account.len(), scope = ?account.scope(), "selected window");

    if let Some(path) = &args.category {
        let category: Category = path
            .parse()
            .with_context(|| format!("invalid category {path:?}"))?;
        account = account.filter(&category);
    }
    if args.reverse {
        account = account.reversed();
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use hermes_core::{LogRecord, Tag, TimeInterval};
    use insta::assert_snapshot;

    use super::*;

    fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
        parse_datetime(s).unwrap()
    }

    fn interval(start: &str, end: &str) -> TimeInterval {
        TimeInterval::new(ts(start), ts(end)).unwrap()
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let work: Category = "Work".parse().unwrap();
        let review = Tag::builder("Review").category(work).build().unwrap();
        db.append(&[
            LogRecord::single(
                interval("2018-04-16T06:00:00Z", "2018-04-16T07:00:00Z"),
                Tag::new("Tag A").unwrap(),
            ),
            LogRecord::single(
                interval("2018-04-16T06:30:00Z", "2018-04-16T07:00:00Z"),
                review,
            ),
            LogRecord::single(
                interval("2018-04-16T07:00:00Z", "2018-04-16T08:30:00Z"),
                Tag::new("Tag C").unwrap(),
            ),
        ])
        .unwrap();
        db
    }

    fn args() -> ShowArgs {
        ShowArgs {
            from: None,
            to: None,
            at: None,
            category: None,
            reverse: false,
            index: None,
            clip: false,
            json: false,
        }
    }

    fn show(args: &ShowArgs) -> String {
        let mut output = Vec::new();
        run(&mut output, &seeded(), &Config::default(), args).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn shows_everything_chronologically() {
        assert_snapshot!(show(&args()), @r"
        2018-04-16T06:00:00Z..2018-04-16T07:00:00Z  Tag('Tag A')
        2018-04-16T06:30:00Z..2018-04-16T07:00:00Z  Tag('Review') [Work]
        2018-04-16T07:00:00Z..2018-04-16T08:30:00Z  Tag('Tag C')
        ");
    }

    #[test]
    fn shows_reversed_window() {
        let mut args = args();
        args.from = Some("2018-04-16T06:45:00Z".to_string());
        args.to = Some("2018-04-16T08:00:00Z".to_string());
        args.reverse = true;
        assert_snapshot!(show(&args), @r"
        2018-04-16T07:00:00Z..2018-04-16T08:30:00Z  Tag('Tag C')
        2018-04-16T06:30:00Z..2018-04-16T07:00:00Z  Tag('Review') [Work]
        2018-04-16T06:00:00Z..2018-04-16T07:00:00Z  Tag('Tag A')
        ");
    }

    #[test]
    fn clipped_window() {
        let mut args = args();
        args.from = Some("2018-04-16T06:45:00Z".to_string());
        args.to = Some("2018-04-16T07:15:00Z".to_string());
        args.category = Some("Work".to_string());
        args.clip = true;
        assert_snapshot!(show(&args), @"2018-04-16T06:45:00Z..2018-04-16T07:00:00Z  Tag('Review') [Work]");
    }

    #[test]
    fn instant_and_index() {
        let mut args = args();
        args.at = Some("2018-04-16T08:00:00Z".to_string());
        assert_eq!(
            show(&args),
            "2018-04-16T07:00:00Z..2018-04-16T08:30:00Z  Tag('Tag C')\n"
        );

        let mut args = self::args();
        args.index = Some(-1);
        assert_eq!(show(&args), "Tag('Tag C')\n");
    }

    #[test]
    fn out_of_range_index_fails() {
        let mut args = args();
        args.index = Some(3);
        let err = run(&mut Vec::new(), &seeded(), &Config::default(), &args).unwrap_err();
        assert_eq!(err.to_string(), "no tag at index 3");
    }

    #[test]
    fn empty_window_is_not_an_error() {
        let mut args = args();
        args.from = Some("2019-01-01T00:00:00Z".to_string());
        args.to = Some("2019-01-02T00:00:00Z".to_string());
        assert_eq!(show(&args), "No taggings.\n");
    }

    #[test]
    fn json_output_includes_scope() {
        let mut args = args();
        args.at = Some("2018-04-16T06:15:00Z".to_string());
        args.json = true;
        let value: serde_json::Value = serde_json::from_str(&show(&args)).unwrap();
        assert_eq!(value["scope"]["start"], "2018-04-16T06:15:00Z");
        assert_eq!(value["taggings"][0]["tag"]["name"], "Tag A");
        assert_eq!(value["taggings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn clip_from_config() {
        let config = Config {
            clip_slices: true,
            ..Config::default()
        };
        let mut args = args();
        args.at = Some("2018-04-16T06:15:00Z".to_string());
        let mut output = Vec::new();
        run(&mut output, &seeded(), &config, &args).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "2018-04-16T06:15:00Z  Tag('Tag A')\n"
        );
    }
}
