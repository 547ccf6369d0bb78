//! Pipeline orchestrator: discovery → classification → breakdown.
//!
//! ## Run order
//!
//! 1. Discover the groups listed under "All Contests". A failure here aborts the run.
//! 2. Classify and break down each group, one page at a time, in discovery order.
//!    A classics game found embedded in a tour page is broken down right after
//!    the group it was found in.
//!
//! With `pipeline.fail_fast` a group error aborts the run; otherwise it is
//! logged with its cause chain and counted.

use crate::models::{GroupBreakdown, GroupType};
use crate::scraper::ScrapeContext;
use crate::scraper::breakdown::BreakdownEngine;
use crate::scraper::discovery::GroupDiscoverer;
use crate::scraper::error::ScrapeError;
use crate::utils;
use tracing::{debug, info, warn};

pub struct Pipeline {
    ctx: ScrapeContext,
}

impl Pipeline {
    pub fn new(ctx: ScrapeContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ScrapeContext {
        &self.ctx
    }

    pub async fn run(&self) -> Result<CalendarRun, ScrapeError> {
        let config = self.ctx.config();

        // ── 1. Discover groups ────────────────────────────────────────────────
        info!("=== Step 1: Discovering competition groups ===");
        let discovered = GroupDiscoverer::new(&self.ctx)
            .discover(&config.discovery.index_url)
            .await?;

        // ── 2. Break down every group ─────────────────────────────────────────
        info!("=== Step 2: Breaking down {} groups ===", discovered.len());
        let engine = BreakdownEngine::new(&self.ctx);
        let mut run = CalendarRun::default();

        for group in &discovered {
            let outcome = match engine.classify_and_breakdown(group).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.on_group_error(e, &mut run)?;
                    continue;
                }
            };

            run.push(outcome.breakdown);

            for spawned in outcome.spawned {
                if !config.pipeline.expand_spawned {
                    debug!("Not expanding spawned group {}", spawned.name);
                    continue;
                }
                match engine.breakdown_classics(spawned).await {
                    Ok(breakdown) => run.push(breakdown),
                    Err(e) => self.on_group_error(e, &mut run)?,
                }
            }
        }

        debug!(
            "Calendar:\n{}",
            utils::render_calendar(&run.groups, &config.dates.generic_format)
        );
        info!(
            "=== Done: {} groups | {} tours | {} classics | {} errors ===",
            run.groups.len(),
            run.tours,
            run.classics,
            run.errors
        );

        Ok(run)
    }

    fn on_group_error(&self, err: ScrapeError, run: &mut CalendarRun) -> Result<(), ScrapeError> {
        if self.ctx.config().pipeline.fail_fast {
            return Err(err);
        }
        warn!("Skipping group: {}", utils::cause_chain(&err));
        run.errors += 1;
        Ok(())
    }
}

/// Everything one run produced, in discovery order.
#[derive(Debug, Default)]
pub struct CalendarRun {
    pub groups: Vec<GroupBreakdown>,
    pub tours: usize,
    pub classics: usize,
    pub errors: usize,
}

impl CalendarRun {
    fn push(&mut self, gb: GroupBreakdown) {
        if gb.breakdown.is_empty() {
            warn!("{}: breakdown is empty", gb.group.name);
        }
        let items = gb.breakdown.len();
        match gb.breakdown.group_type() {
            GroupType::Tour => self.tours += items,
            GroupType::Classics => self.classics += items,
        }
        self.groups.push(gb);
    }
}
