//! Group classifier and breakdown engine.
//!
//! A group page is either a list of stage races (tour group) or a single
//! container pointing at a table of one-day races (classics group). The first
//! container of a tour page may in fact be a women's classics game; it is
//! split out as a group of its own and left out of the tour list.

use crate::models::{
    Breakdown, ClassicRace, CompetitionGroup, DiscoveredGroup, GroupBreakdown, GroupOutcome,
    GroupType, TourStage,
};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::{
    complete_year, correct_ordinal, format_date, parse_date, replace_keeping_year,
    strip_ordinal_suffixes,
};
use crate::scraper::error::ScrapeError;
use crate::scraper::parsers::{ClassicRow, TourItem, parse_classics_table, parse_group_page};
use crate::scraper::stages::StageResolver;
use chrono::NaiveDateTime;
use tracing::{debug, info};

pub struct BreakdownEngine<'a> {
    ctx: &'a ScrapeContext,
    stages: StageResolver<'a>,
}

/// A tour container after text and date normalisation, before stage lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TourHeader {
    pub url: String,
    pub description: String,
    pub start_date: NaiveDateTime,
}

impl<'a> BreakdownEngine<'a> {
    pub fn new(ctx: &'a ScrapeContext) -> Self {
        Self {
            ctx,
            stages: StageResolver::new(ctx),
        }
    }

    /// Classify a discovered group and break it down. Errors carry the group name.
    pub async fn classify_and_breakdown(
        &self,
        group: &DiscoveredGroup,
    ) -> Result<GroupOutcome, ScrapeError> {
        info!("Processing group: {} ({})", group.name, group.gender);
        self.process(group)
            .await
            .map_err(|e| e.in_group(&group.name))
    }

    /// Break down a group whose type is already known to be classics.
    pub async fn breakdown_classics(
        &self,
        group: CompetitionGroup,
    ) -> Result<GroupBreakdown, ScrapeError> {
        info!("Processing classics group: {} ({})", group.name, group.gender);
        match self.classics(&group.url).await {
            Ok(races) => Ok(GroupBreakdown {
                group,
                breakdown: Breakdown::Classics(races),
            }),
            Err(e) => Err(e.in_group(&group.name)),
        }
    }

    async fn process(&self, group: &DiscoveredGroup) -> Result<GroupOutcome, ScrapeError> {
        let cfg = &self.ctx.config().breakdown;
        let url = self.ctx.absolute_url(&group.url)?;

        let html = self.ctx.fetch_page(&url).await?;
        let page = parse_group_page(&html, cfg, &url)?;
        debug!("{}: classified as {}", group.name, page.group_type);

        let mut spawned = Vec::new();
        if let Some(embedded) = &page.embedded_classics {
            let name = self.ctx.clean_name(&embedded.heading, &cfg.noise_tokens);
            info!("{}: found embedded classics group `{}`", group.name, name);
            spawned.push(CompetitionGroup {
                name,
                gender: group.gender,
                url: self.ctx.absolute_url(&embedded.href)?,
                group_type: GroupType::Classics,
            });
        }

        let breakdown = match page.group_type {
            GroupType::Tour => Breakdown::Tours(self.tours(&page.tour_items).await?),
            GroupType::Classics => Breakdown::Classics(self.classics(&url).await?),
        };

        Ok(GroupOutcome {
            breakdown: GroupBreakdown {
                group: CompetitionGroup {
                    name: group.name.clone(),
                    gender: group.gender,
                    url,
                    group_type: page.group_type,
                },
                breakdown,
            },
            spawned,
        })
    }

    async fn tours(&self, items: &[TourItem]) -> Result<Vec<TourStage>, ScrapeError> {
        let mut tours = Vec::with_capacity(items.len());
        for item in items {
            let header = self.tour_header(item)?;
            let summary = self.stages.resolve(&header.url, header.start_date).await?;
            tours.push(TourStage {
                url: header.url,
                description: header.description,
                stage_count: summary.stage_count,
                tour_size: summary.tour_size,
                start_date: header.start_date,
                end_date: summary.end_date,
            });
        }
        Ok(tours)
    }

    /// Start date, display name and detail URL of one tour container.
    pub fn tour_header(&self, item: &TourItem) -> Result<TourHeader, ScrapeError> {
        let cfg = &self.ctx.config().breakdown;

        let date_text = complete_year(
            &strip_ordinal_suffixes(&item.start_date),
            self.ctx.season_year(),
        );
        let start_date = parse_date(&date_text, &cfg.tour_date_format)?;

        let renamed = replace_keeping_year(&item.heading, &cfg.male_tour_rename);
        let renamed = replace_keeping_year(&renamed, &cfg.female_tour_rename);
        let description = self.ctx.clean_name(&renamed, &cfg.noise_tokens);

        Ok(TourHeader {
            url: self.ctx.absolute_url(&item.href)?,
            description,
            start_date,
        })
    }

    async fn classics(&self, group_url: &str) -> Result<Vec<ClassicRace>, ScrapeError> {
        let cfg = &self.ctx.config().breakdown;
        let detail_url = format!("{}{}", group_url, cfg.detail_suffix);

        let html = self.ctx.fetch_page(&detail_url).await?;
        let rows = parse_classics_table(&html, &cfg.classic_columns, &detail_url)?;

        rows.into_iter()
            .map(|row| self.classic_race(row, &detail_url))
            .collect()
    }

    /// Normalise one table row; the ordinal loses any glued-on date.
    pub fn classic_race(&self, row: ClassicRow, url: &str) -> Result<ClassicRace, ScrapeError> {
        let cfg = &self.ctx.config().breakdown;

        let date = parse_date(&row.date, &cfg.classic_date_format)?;
        let rendered = format_date(&date, &self.ctx.config().dates.generic_format);
        let category = row
            .category
            .chars()
            .last()
            .ok_or_else(|| ScrapeError::markup(url, format!("category of `{}`", row.name)))?;

        Ok(ClassicRace {
            ordinal: correct_ordinal(&row.ordinal, &rendered),
            date,
            name: row.name,
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, TourSize};
    use crate::scraper::fixtures::*;
    use crate::scraper::testing::{FakeFetcher, context};
    use chrono::NaiveDate;
    use std::error::Error;
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn discovered(name: &str, gender: Gender, url: &str) -> DiscoveredGroup {
        DiscoveredGroup {
            name: name.into(),
            gender,
            url: url.into(),
        }
    }

    #[tokio::test]
    async fn grand_tour_breakdown() {
        let ctx = context(
            FakeFetcher::default()
                .with_page(TDF_GROUP_URL, TDF_GROUP)
                .with_page(TDF_STAGES_URL, &stages_page(21)),
        );
        let engine = BreakdownEngine::new(&ctx);
        let outcome = engine
            .classify_and_breakdown(&discovered(
                "Tour de France",
                Gender::Male,
                "tour-de-france/2024/",
            ))
            .await
            .unwrap();

        assert!(outcome.spawned.is_empty());
        let group = &outcome.breakdown.group;
        assert_eq!(group.url, TDF_GROUP_URL);
        assert_eq!(group.group_type, GroupType::Tour);

        let Breakdown::Tours(tours) = &outcome.breakdown.breakdown else {
            panic!("expected tours");
        };
        assert_eq!(
            tours,
            &vec![TourStage {
                url: TDF_GROUP_URL.into(),
                description: "Tour de France Men 2024".into(),
                stage_count: 21,
                tour_size: TourSize::Grand,
                start_date: day(2024, 6, 29),
                end_date: day(2024, 7, 21),
            }]
        );
    }

    #[tokio::test]
    async fn womens_classics_are_split_out() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with_page(FEMMES_GROUP_URL, FEMMES_GROUP)
                .with_page(FEMMES_STAGES_URL, &stages_page(8)),
        );
        let ctx = crate::scraper::ScrapeContext::new(
            crate::config::sample(),
            Box::new(fetcher.clone()),
        );
        let engine = BreakdownEngine::new(&ctx);
        let outcome = engine
            .classify_and_breakdown(&discovered(
                "Tour de France Femmes",
                Gender::Female,
                "tour-de-france-femmes/2024/",
            ))
            .await
            .unwrap();

        assert_eq!(
            outcome.spawned,
            vec![CompetitionGroup {
                name: "Womens Classics 2024".into(),
                gender: Gender::Female,
                url: "https://www.velogames.com/womens-classics/2024/".into(),
                group_type: GroupType::Classics,
            }]
        );

        let Breakdown::Tours(tours) = &outcome.breakdown.breakdown else {
            panic!("expected tours");
        };
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0].description, "Tour de France Women 2024");
        assert_eq!(tours[0].tour_size, TourSize::Minor);
        assert_eq!(tours[0].start_date, day(2024, 8, 12));
        assert_eq!(tours[0].end_date, day(2024, 8, 19));

        // The embedded game's own pages were never treated as a tour.
        let requested = fetcher.requested.lock().unwrap();
        assert!(!requested.iter().any(|u| u.contains("womens-classics")));
    }

    #[tokio::test]
    async fn classics_breakdown_keeps_row_order() {
        let ctx = context(
            FakeFetcher::default()
                .with_page(CLASSICS_GROUP_URL, CLASSICS_GROUP)
                .with_page(CLASSICS_RACES_URL, CLASSICS_RACES),
        );
        let engine = BreakdownEngine::new(&ctx);
        let outcome = engine
            .classify_and_breakdown(&discovered(
                "Spring Classics",
                Gender::Male,
                CLASSICS_GROUP_URL,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.breakdown.group.group_type, GroupType::Classics);
        let Breakdown::Classics(races) = &outcome.breakdown.breakdown else {
            panic!("expected classics");
        };
        let summary: Vec<(&str, &str, char)> = races
            .iter()
            .map(|r| (r.ordinal.as_str(), r.name.as_str(), r.category))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1", "Strade Bianche", 'A'),
                ("2", "Milano-Sanremo", 'M'),
                ("3", "Paris-Roubaix", 'M'),
            ]
        );
        assert_eq!(races[0].date, day(2024, 3, 2));
    }

    #[tokio::test]
    async fn spawned_group_breaks_down_as_classics() {
        let ctx = context(
            FakeFetcher::default().with_page(WOMENS_CLASSICS_RACES_URL, WOMENS_CLASSICS_RACES),
        );
        let engine = BreakdownEngine::new(&ctx);
        let group = CompetitionGroup {
            name: "Womens Classics 2024".into(),
            gender: Gender::Female,
            url: "https://www.velogames.com/womens-classics/2024/".into(),
            group_type: GroupType::Classics,
        };
        let result = engine.breakdown_classics(group).await.unwrap();
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown.group_type(), GroupType::Classics);
    }

    #[tokio::test]
    async fn missing_classics_table_names_the_group() {
        let ctx = context(
            FakeFetcher::default()
                .with_page(CLASSICS_GROUP_URL, CLASSICS_GROUP)
                .with_page(CLASSICS_RACES_URL, "<p>no races yet</p>"),
        );
        let engine = BreakdownEngine::new(&ctx);
        let err = engine
            .classify_and_breakdown(&discovered(
                "Spring Classics",
                Gender::Male,
                CLASSICS_GROUP_URL,
            ))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "failed to process group `Spring Classics`");
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains(CLASSICS_RACES_URL), "{cause}");
    }

    #[test]
    fn tour_header_with_explicit_year_is_untouched() {
        let ctx = context(FakeFetcher::default());
        let engine = BreakdownEngine::new(&ctx);
        let header = engine
            .tour_header(&TourItem {
                start_date: "4th May 2025".into(),
                heading: "Velogames Giro d'Italia 2025".into(),
                href: "giro-d-italia/2025/".into(),
            })
            .unwrap();
        assert_eq!(header.start_date, day(2025, 5, 4));
        assert_eq!(header.description, "Giro d'Italia 2025");
        assert_eq!(header.url, "https://www.velogames.com/giro-d-italia/2025/");
    }

    #[test]
    fn unparseable_start_date_is_a_date_error() {
        let ctx = context(FakeFetcher::default());
        let engine = BreakdownEngine::new(&ctx);
        let err = engine
            .tour_header(&TourItem {
                start_date: "TBC".into(),
                heading: "Velogames Vuelta".into(),
                href: "vuelta/".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ScrapeError::DateParse { .. }), "{err:?}");
    }

    #[test]
    fn empty_category_is_a_markup_error() {
        let ctx = context(FakeFetcher::default());
        let engine = BreakdownEngine::new(&ctx);
        let row = ClassicRow {
            ordinal: "4".into(),
            date: "14/04/2024".into(),
            name: "Amstel Gold Race".into(),
            category: String::new(),
        };
        let err = engine.classic_race(row, CLASSICS_RACES_URL).unwrap_err();
        assert!(matches!(err, ScrapeError::MarkupShape { .. }));
    }
}
