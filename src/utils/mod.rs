use crate::models::{Breakdown, GroupBreakdown};
use crate::scraper::cleaner::format_date;
use std::error::Error;
use std::fmt::Write;
use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.elapsed()
        );
    }
}

/// Renders an error and its sources, innermost cause first.
pub fn cause_chain(err: &(dyn Error + 'static)) -> String {
    let mut chain: Vec<String> = std::iter::successors(Some(err), |&e| e.source())
        .map(|e| e.to_string())
        .collect();
    chain.reverse();
    chain.join(" <- ")
}

/// Plain-text season listing, one block per group.
pub fn render_calendar(groups: &[GroupBreakdown], date_format: &str) -> String {
    let mut out = String::new();
    for gb in groups {
        let g = &gb.group;
        let _ = writeln!(out, "{} [{}, {}] {}", g.name, g.gender, g.group_type, g.url);
        match &gb.breakdown {
            Breakdown::Tours(stages) => {
                for s in stages {
                    let _ = writeln!(
                        out,
                        "  {} → {}  {} ({} stages, {})",
                        format_date(&s.start_date, date_format),
                        format_date(&s.end_date, date_format),
                        s.description,
                        s.stage_count,
                        s.tour_size
                    );
                }
            }
            Breakdown::Classics(races) => {
                for r in races {
                    let _ = writeln!(
                        out,
                        "  {:>3}  {}  {} [{}]",
                        r.ordinal,
                        format_date(&r.date, date_format),
                        r.name,
                        r.category
                    );
                }
            }
        }
    }
    out
}
