use crate::config::BreakdownConfig;
use crate::models::TourSize;
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::add_days;
use crate::scraper::error::ScrapeError;
use crate::scraper::parsers::count_stages;
use chrono::NaiveDateTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSummary {
    pub stage_count: u32,
    pub tour_size: TourSize,
    pub end_date: NaiveDateTime,
}

/// Turns a tour's detail page into a stage count and an end date.
pub struct StageResolver<'a> {
    ctx: &'a ScrapeContext,
}

impl<'a> StageResolver<'a> {
    pub fn new(ctx: &'a ScrapeContext) -> Self {
        Self { ctx }
    }

    pub async fn resolve(
        &self,
        url: &str,
        start_date: NaiveDateTime,
    ) -> Result<StageSummary, ScrapeError> {
        let cfg = &self.ctx.config().breakdown;
        let detail_url = format!("{}{}", url, cfg.detail_suffix);

        let wrap = |source: ScrapeError| ScrapeError::Stages {
            url: detail_url.clone(),
            source: Box::new(source),
        };

        let html = self.ctx.fetch_page(&detail_url).await.map_err(wrap)?;
        let stage_count = count_stages(&html, cfg).map_err(wrap)?;
        let summary = summarize(stage_count, start_date, cfg).map_err(wrap)?;

        debug!(
            "{}: {} stages, {} tour, ends {}",
            detail_url, summary.stage_count, summary.tour_size, summary.end_date
        );
        Ok(summary)
    }
}

/// `end = start + (stages - 1 + rest days)`; rest days only for grand tours.
///
/// Zero stages gives the day before `start_date`.
pub fn summarize(
    stage_count: u32,
    start_date: NaiveDateTime,
    cfg: &BreakdownConfig,
) -> Result<StageSummary, ScrapeError> {
    let tour_size = if stage_count == cfg.grand_tour_stages {
        TourSize::Grand
    } else {
        TourSize::Minor
    };
    let rest_days = match tour_size {
        TourSize::Grand => cfg.grand_tour_rest_days,
        TourSize::Minor => 0,
    };

    let span = i64::from(stage_count) - 1 + i64::from(rest_days);
    let end_date = add_days(start_date, span)?;

    Ok(StageSummary {
        stage_count,
        tour_size,
        end_date,
    })
}
