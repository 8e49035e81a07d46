//! Class listing scraper: crawls the faculty pages of a term, normalises
//! timetable descriptors into structured class times and removes duplicate
//! streams.

pub mod config;
pub mod error;
pub mod output;
pub mod scrape;
pub mod timetable;

pub use config::ScrapeConfig;
pub use error::ScrapeError;
