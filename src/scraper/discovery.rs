use crate::models::{DiscoveredGroup, Gender};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::{contains_any, strip_prefix_ignore_case};
use crate::scraper::error::ScrapeError;
use crate::scraper::parsers::parse_group_links;
use tracing::{info, warn};

/// Finds the competition groups listed under "All Contests" on the index page.
pub struct GroupDiscoverer<'a> {
    ctx: &'a ScrapeContext,
}

impl<'a> GroupDiscoverer<'a> {
    pub fn new(ctx: &'a ScrapeContext) -> Self {
        Self { ctx }
    }

    /// A missing heading yields an empty list, not an error.
    pub async fn discover(&self, index_url: &str) -> Result<Vec<DiscoveredGroup>, ScrapeError> {
        self.try_discover(index_url)
            .await
            .map_err(|e| ScrapeError::Discovery {
                source: Box::new(e),
            })
    }

    async fn try_discover(&self, index_url: &str) -> Result<Vec<DiscoveredGroup>, ScrapeError> {
        let cfg = &self.ctx.config().discovery;
        info!("Discovering competition groups from {}", index_url);

        let html = self.ctx.fetch_page(index_url).await?;
        let Some(links) = parse_group_links(&html, cfg, index_url)? else {
            warn!("No `{}` heading on {}", cfg.heading_text, index_url);
            return Ok(vec![]);
        };

        let groups: Vec<DiscoveredGroup> = links
            .into_iter()
            .map(|link| {
                let name = strip_prefix_ignore_case(&link.text, &cfg.name_prefix);
                let gender = if contains_any(&name, &cfg.female_markers) {
                    Gender::Female
                } else {
                    Gender::Male
                };
                info!("Group found: {} ({}) -> {}", name, gender, link.href);
                DiscoveredGroup {
                    name,
                    gender,
                    url: link.href,
                }
            })
            .collect();

        info!("{} competition groups discovered", groups.len());
        Ok(groups)
    }
}
