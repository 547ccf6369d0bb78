use crate::config::HttpConfig;
use crate::scraper::PageFetcher;
use crate::scraper::error::ScrapeError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, ScrapeError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .map_err(|source| ScrapeError::Fetch {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        self.polite_delay().await;
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        resp.text().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let jitter_ms = if self.config.jitter_ms > 0 {
            rand::random_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        let total = Duration::from_millis(self.config.request_delay_ms + jitter_ms);
        if !total.is_zero() {
            sleep(total).await;
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    /// One attempt plus `max_retries` retries, only for transient failures.
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let backoff = ExponentialBackoff::from_millis(2)
            .factor(self.config.request_delay_ms.max(1))
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.config.max_retries);

        RetryIf::spawn(
            backoff,
            || self.get_once(url),
            |e: &ScrapeError| {
                let retry = e.is_transient();
                if retry {
                    warn!("Transient failure on {}: {}, retrying", url, e);
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let client = HttpClient::new(&HttpConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let config = HttpConfig {
            request_delay_ms: 0,
            jitter_ms: 0,
            timeout_secs: 2,
            ..HttpConfig::default()
        };
        let client = HttpClient::new(&config).unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let err = client.fetch_page("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { .. }), "{err:?}");
    }
}
