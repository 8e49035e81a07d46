/// Crawling and reading of the class listing site
mod cache;
mod client;
mod page;

pub use cache::PageCache;
pub use client::{Crawl, CrawlStats, Crawler, CrawlerConfig, Fetched};
pub use page::{find_faculty_links, parse_faculty_page};

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::timetable::{apply_full_names, process_rows, Course, DescriptorParser, QualityReport};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything one scrape of a term produces.
#[derive(Debug, Default)]
pub struct TermScrape {
    pub courses: Vec<Course>,
    pub report: QualityReport,
    pub stats: CrawlStats,
}

/// Reads crawled faculty pages into courses.
///
/// Pages are processed independently and concatenated in crawl order.
pub fn read_pages(pages: &[Fetched], parser: &DescriptorParser) -> (Vec<Course>, QualityReport) {
    let mut courses = Vec::new();
    let mut report = QualityReport::default();

    for page in pages {
        let rows = parse_faculty_page(&page.html);
        let (page_courses, page_report) = process_rows(rows, parser);
        debug!(url = %page.url, courses = page_courses.len(), "Read faculty page");

        courses.extend(page_courses);
        report.merge(page_report);
    }

    (courses, report)
}

/// Crawls the listing for the configured term and reads every faculty page.
///
/// # Arguments
/// * `config` - The scrape configuration
/// * `cache` - Page cache shared with the crawler
///
/// # Returns
/// * `Ok(TermScrape)` - Courses, quality findings and crawl counters
/// * `Err` - If the index page can't be fetched or lists no faculty pages
pub async fn scrape_term(
    config: &ScrapeConfig,
    cache: Arc<PageCache>,
) -> Result<TermScrape, ScrapeError> {
    let crawler = Crawler::new(config.crawler_config(), cache)?;
    let crawl = crawler.crawl(&config.url, &config.term).await?;

    let parser = DescriptorParser::new(config.parser_options());
    let (mut courses, report) = read_pages(&crawl.pages, &parser);

    let full_names = config.load_course_names()?;
    if !full_names.is_empty() {
        apply_full_names(&mut courses, &full_names);
    }

    info!(
        term = %config.term,
        courses = courses.len(),
        issues = report.has_issues(),
        "Scrape complete"
    );

    Ok(TermScrape {
        courses,
        report,
        stats: crawl.stats,
    })
}
