//! Subcommand handlers.

use std::path::Path;

use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nestlog_core::{Category, NestlogConfig};
use nestlog_extract::{Pipeline, decode_transcript};
use nestlog_store::{ActivityStore, JsonStore, RecordFilter, StoredRecord, to_record_batch};
use tracing::info;

use crate::display;

pub fn import(
    config: &NestlogConfig,
    file: &Path,
    subject: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("reading transcript {}", file.display()))?;
    let text = decode_transcript(&bytes)?;
    let pipeline = Pipeline::from_config(&config.parse);

    let (_, report) = if dry_run {
        pipeline.process_transcript(text, subject)?
    } else {
        let mut store = open_store(config)?;
        pipeline.import_transcript(text, subject, &mut store)?
    };

    display::print_report(&report, dry_run);
    Ok(())
}

pub fn add(
    config: &NestlogConfig,
    subject: &str,
    text: &str,
    sender: Option<&str>,
    at: Option<&str>,
) -> anyhow::Result<()> {
    let occurred_at = at.map(|s| parse_when(s, false)).transpose()?;
    let pipeline = Pipeline::from_config(&config.parse);

    let Some(record) = pipeline.process_single_message(subject, text, sender, occurred_at) else {
        bail!("no activity recognised in {text:?}");
    };

    let mut store = open_store(config)?;
    let id = store.save(subject, record.clone())?;
    info!(subject, %id, "saved manual entry");

    let batch = to_record_batch(&[StoredRecord { id, record }])?;
    display::print_record_cards(&batch);
    Ok(())
}

pub fn classify(config: &NestlogConfig, text: &str) {
    let pipeline = Pipeline::from_config(&config.parse);
    let matched = pipeline.classify(text);
    let quantities = pipeline.extract_quantities(text);
    display::print_match(&matched, &quantities);
}

pub fn list(
    config: &NestlogConfig,
    subject: &str,
    from: Option<&str>,
    to: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let filter = RecordFilter {
        from: from.map(|s| parse_when(s, false)).transpose()?,
        to: to.map(|s| parse_when(s, true)).transpose()?,
        category: category
            .map(|c| c.parse::<Category>().map_err(|e| anyhow!(e)))
            .transpose()?,
    };

    let store = open_store(config)?;
    let records = store.list(subject, &filter)?;
    if records.is_empty() {
        println!("No records for {subject}.");
        return Ok(());
    }

    let batch = to_record_batch(&records)?;
    display::print_record_cards(&batch);
    println!("{} record(s)", records.len());
    Ok(())
}

pub fn export(config: &NestlogConfig, subject: &str, out: &Path) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let records = store.list(subject, &RecordFilter::default())?;
    let rows = nestlog_store::write_parquet(out, &records)
        .with_context(|| format!("writing {}", out.display()))?;
    println!("Wrote {rows} record(s) to {}", out.display());
    Ok(())
}

fn open_store(config: &NestlogConfig) -> anyhow::Result<JsonStore> {
    let dir = &config.store.data_dir;
    JsonStore::open(dir).with_context(|| format!("opening data directory {}", dir.display()))
}

/// Parse `YYYY-MM-DD HH:MM[:SS]`, the same with a `T`, or a bare date. A bare
/// date means the start of the day, or its last second when `end_of_day`.
fn parse_when(s: &str, end_of_day: bool) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date/time {s:?}, expected YYYY-MM-DD [HH:MM]"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        Some(NaiveTime::MIN)
    };
    time.map(|t| date.and_time(t))
        .ok_or_else(|| anyhow!("invalid time of day"))
}
