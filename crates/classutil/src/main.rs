use anyhow::{Context, Result};
use classutil::output::{write_output, Meta, ScrapeOutput};
use classutil::scrape::{scrape_term, PageCache};
use classutil::ScrapeConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = ".config.json";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = ScrapeConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(url = %config.url, term = %config.term, year = config.year, "Starting scrape");

    let cache = Arc::new(
        PageCache::open(config.cache.as_deref())
            .await
            .context("failed to open page cache")?,
    );

    // Ctrl-C stops the crawl; pages fetched so far are still cached.
    let scrape = tokio::select! {
        result = scrape_term(&config, cache.clone()) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, saving page cache");
            cache.save().await.context("failed to save page cache")?;
            anyhow::bail!("scrape interrupted");
        }
    };

    // Whatever was fetched is worth keeping even if the scrape failed.
    cache.save().await.context("failed to save page cache")?;
    let scrape = scrape.context("scrape failed")?;

    let report = &scrape.report;
    if report.has_issues() {
        warn!(
            malformed_enrolments = report.malformed_enrolments.len(),
            over_enrolled = report.over_enrolled.len(),
            inconsistent_durations = report.inconsistent_durations.len(),
            "Listing has data quality issues"
        );
    }

    let output = ScrapeOutput {
        courses: scrape.courses,
        meta: Meta::now(config.term.as_str(), config.year, config.utc_offset_hours),
    };
    write_output(&config.output, &output)
        .await
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    info!(
        courses = output.courses.len(),
        pages_fetched = scrape.stats.pages_fetched,
        cache_hits = scrape.stats.cache_hits,
        bytes = scrape.stats.bytes_downloaded,
        failures = scrape.stats.failures,
        "Done"
    );

    Ok(())
}
