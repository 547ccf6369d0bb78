//! Flattens a run into one row per tour or race and writes it out.

use crate::models::{Breakdown, CalendarEntry, GroupBreakdown};
use crate::scraper::cleaner::format_date;
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

pub fn calendar_entries(groups: &[GroupBreakdown], date_format: &str) -> Vec<CalendarEntry> {
    let mut entries = Vec::new();
    for gb in groups {
        let g = &gb.group;
        let entry = |name: &str, start, end, class: String, url: &str| CalendarEntry {
            group: g.name.clone(),
            gender: g.gender,
            group_type: g.group_type,
            name: name.to_string(),
            start: format_date(start, date_format),
            end: format_date(end, date_format),
            class,
            url: url.to_string(),
        };
        match &gb.breakdown {
            Breakdown::Tours(stages) => entries.extend(stages.iter().map(|s| {
                entry(
                    &s.description,
                    &s.start_date,
                    &s.end_date,
                    s.tour_size.to_string(),
                    &s.url,
                )
            })),
            Breakdown::Classics(races) => entries.extend(races.iter().map(|r| {
                entry(&r.name, &r.date, &r.date, r.category.to_string(), &g.url)
            })),
        }
    }
    entries
}

pub fn write_entries<W: Write>(
    entries: &[CalendarEntry],
    format: ExportFormat,
    out: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(entries, out),
        ExportFormat::Json => write_json(entries, out),
    }
}

pub fn write_csv<W: Write>(entries: &[CalendarEntry], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for e in entries {
        writer
            .serialize(e)
            .with_context(|| format!("csv row for {}", e.name))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(entries: &[CalendarEntry], mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, entries)?;
    writeln!(out)?;
    Ok(())
}
