pub mod breakdown;
pub mod cleaner;
pub mod discovery;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod http_client;
pub mod parsers;
pub mod stages;

use crate::config::AppConfig;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tracing::info;

use self::error::ScrapeError;

// ── Fetcher trait ─────────────────────────────────────────────────────────────

/// Swappable page source. Returns raw HTML; parsing happens in [`parsers`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
}

// ── Shared context ────────────────────────────────────────────────────────────

/// Read-only state every scraping component works through: configuration
/// plus the page fetcher. Built once per run.
pub struct ScrapeContext {
    fetcher: Box<dyn PageFetcher>,
    config: AppConfig,
    season_year: i32,
}

impl ScrapeContext {
    pub fn new(config: AppConfig, fetcher: Box<dyn PageFetcher>) -> Self {
        let season_year = config.dates.season_year.unwrap_or_else(|| Utc::now().year());
        Self {
            fetcher,
            config,
            season_year,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Year appended to dates that arrive without one.
    pub fn season_year(&self) -> i32 {
        self.season_year
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        info!("Fetching {}", url);
        self.fetcher.fetch_page(url).await
    }

    /// `section.key` lookup with a fallback for keys that have a documented default.
    pub fn config_value(&self, section: &str, key: &str, default: &str) -> String {
        self.config
            .value(section, key)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn clean_name(&self, text: &str, tokens: &[String]) -> String {
        cleaner::remove_tokens(text, tokens)
    }

    pub fn absolute_url(&self, href: &str) -> Result<String, ScrapeError> {
        cleaner::absolute_url(&self.config.http.base_url, href)
    }
}

// ── Test fetcher ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages by URL and remembers what was asked for.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::HttpStatus {
                    url: url.to_string(),
                    status: StatusCode::NOT_FOUND,
                })
        }
    }

    #[async_trait]
    impl PageFetcher for std::sync::Arc<FakeFetcher> {
        async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
            self.as_ref().fetch_page(url).await
        }
    }

    pub fn context(fetcher: FakeFetcher) -> ScrapeContext {
        ScrapeContext::new(crate::config::sample(), Box::new(fetcher))
    }
}
