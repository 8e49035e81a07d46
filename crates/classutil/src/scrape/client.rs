//! HTTP client for the class listing site.
//!
//! Handles the two-level crawl:
//! 1. Fetch the index page
//! 2. Discover the faculty pages for the term
//! 3. Fetch faculty pages with a bounded number in flight
//!
//! Pages already in the cache are never requested again.

use super::cache::PageCache;
use super::page::find_faculty_links;
use crate::error::ScrapeError;
use futures::stream::{self, StreamExt};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Configuration for the listing crawler.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight
    pub window: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Base delay between retries (will use exponential backoff)
    pub retry_interval_base: Duration,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            window: 20,
            timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_interval_base: Duration::from_millis(500),
            user_agent: concat!("classutil/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Counters for one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub cache_hits: usize,
    pub bytes_downloaded: u64,
    pub failures: usize,
}

impl CrawlStats {
    fn record(&mut self, fetch: &Fetched) {
        if fetch.from_cache {
            self.cache_hits += 1;
        } else {
            self.pages_fetched += 1;
            self.bytes_downloaded += fetch.html.len() as u64;
        }
    }
}

/// A page body and where it came from.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub url: String,
    pub html: String,
    pub from_cache: bool,
}

/// Result of crawling every faculty page of a term.
#[derive(Debug, Default)]
pub struct Crawl {
    /// Faculty page bodies, in index order
    pub pages: Vec<Fetched>,
    pub stats: CrawlStats,
}

/// Client for fetching the class listing pages.
pub struct Crawler {
    client: Client,
    config: CrawlerConfig,
    cache: Arc<PageCache>,
}

impl Crawler {
    /// Creates a new crawler sharing `cache`.
    pub fn new(config: CrawlerConfig, cache: Arc<PageCache>) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScrapeError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }

    /// Fetches the index page and every faculty page for `term`.
    ///
    /// A faculty page that still fails after its retries is logged and
    /// left out; the index page failing fails the crawl.
    pub async fn crawl(&self, index_url: &str, term: &str) -> Result<Crawl, ScrapeError> {
        let start = Instant::now();
        let base = Url::parse(index_url)?;
        let mut stats = CrawlStats::default();

        let index = self.fetch(base.as_str()).await?;
        stats.record(&index);

        let urls = find_faculty_links(&index.html, term)
            .iter()
            .map(|link| base.join(link).map(String::from))
            .collect::<Result<Vec<_>, _>>()?;

        if urls.is_empty() {
            return Err(ScrapeError::NoFacultyPages {
                term: term.to_string(),
            });
        }

        info!(term = %term, faculties = urls.len(), "Discovered faculty pages");

        let results: Vec<_> = stream::iter(urls)
            .map(|url| async move {
                let result = self.fetch(&url).await;
                (url, result)
            })
            .buffered(self.config.window.max(1))
            .collect()
            .await;

        let mut pages = Vec::with_capacity(results.len());
        for (url, result) in results {
            match result {
                Ok(page) => {
                    stats.record(&page);
                    pages.push(page);
                }
                Err(e) => {
                    stats.failures += 1;
                    warn!(url = %url, error = %e, "Skipping faculty page");
                }
            }
        }

        info!(
            pages = pages.len(),
            fetched = stats.pages_fetched,
            cache_hits = stats.cache_hits,
            bytes = stats.bytes_downloaded,
            failures = stats.failures,
            duration_ms = start.elapsed().as_millis() as u64,
            "Crawl complete"
        );

        Ok(Crawl { pages, stats })
    }

    /// Fetches one page, from the cache if present, retrying transient failures.
    pub async fn fetch(&self, url: &str) -> Result<Fetched, ScrapeError> {
        if let Some(html) = self.cache.get(url) {
            debug!(url = %url, "Cache hit");
            return Ok(Fetched {
                url: url.to_string(),
                html,
                from_cache: true,
            });
        }

        let mut attempt = 0u32;
        loop {
            match self.get_once(url).await {
                Ok(html) => {
                    self.cache.insert(url, html.clone());
                    return Ok(Fetched {
                        url: url.to_string(),
                        html,
                        from_cache: false,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.calculate_retry_delay(attempt);
                    debug!(
                        url = %url,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Calculates retry delay with exponential backoff and jitter.
    fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_interval_base.as_millis() as u64;
        // Exponential backoff: base * 2^min(attempt-1, 5)
        let exponential = base * 2u64.pow(attempt.saturating_sub(1).min(5));
        // Cap at 10 seconds
        let capped = exponential.min(10_000);
        // Add jitter: 0-20% of the delay
        let jitter = rand::thread_rng().gen_range(0..=(capped / 5));
        Duration::from_millis(capped + jitter)
    }
}
