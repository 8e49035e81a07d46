/// Scrape configuration, read from a JSON file
use crate::error::ScrapeError;
use crate::scrape::CrawlerConfig;
use crate::timetable::{ParserOptions, WeekElevenPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level scrape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Index page listing the faculty pages
    pub url: String,
    /// Term code used in faculty page names (e.g. "1" for `COMP_T1.html`)
    pub term: String,
    pub year: u16,
    /// Where the output JSON is written
    pub output: PathBuf,
    /// Page cache file; no cache when absent
    #[serde(default)]
    pub cache: Option<PathBuf>,
    /// JSON map of course code to full course name
    #[serde(default)]
    pub course_names: Option<PathBuf>,
    /// Maximum number of pages fetched at once
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Campus offset from UTC, used for the update timestamp
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default)]
    pub week_eleven: WeekElevenPolicy,
}

fn default_window() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_utc_offset_hours() -> i32 {
    10
}

impl ScrapeConfig {
    /// Loads and validates a config file.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON config file
    ///
    /// # Returns
    /// * `Ok(ScrapeConfig)` - The loaded configuration
    /// * `Err` - If the file can't be read, parsed, or holds invalid values
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        let content = fs::read_to_string(path)?;
        let config: ScrapeConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.term.trim().is_empty() {
            return Err(ScrapeError::Config {
                message: "term must not be empty".to_string(),
            });
        }
        if self.window == 0 {
            return Err(ScrapeError::Config {
                message: "window must be at least 1".to_string(),
            });
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(ScrapeError::Config {
                message: format!("utc_offset_hours out of range: {}", self.utc_offset_hours),
            });
        }
        url::Url::parse(&self.url)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig {
            window: self.window,
            timeout: self.timeout(),
            max_retries: self.max_retries,
            ..CrawlerConfig::default()
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            week_eleven: self.week_eleven,
        }
    }

    /// Loads the course full-name map, or an empty map if none is configured.
    pub fn load_course_names(&self) -> Result<HashMap<String, String>, ScrapeError> {
        match &self.course_names {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            None => Ok(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_applied() {
        let config: ScrapeConfig = serde_json::from_str(
            r#"{"url": "http://classutil.unsw.edu.au/", "term": "1", "year": 2024, "output": "data.json"}"#,
        )
        .unwrap();

        assert_eq!(config.window, 20);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.utc_offset_hours, 10);
        assert_eq!(config.week_eleven, WeekElevenPolicy::RejectIfOnly);
        assert!(config.cache.is_none());
        assert!(config.validate().is_ok());

        let crawler = config.crawler_config();
        assert_eq!(crawler.window, 20);
        assert_eq!(crawler.max_retries, 3);
    }

    #[test]
    fn test_week_eleven_from_config() {
        let config: ScrapeConfig = serde_json::from_str(
            r#"{"url": "http://x/", "term": "2", "year": 2024, "output": "o.json", "week_eleven": "always_exclude"}"#,
        )
        .unwrap();
        assert_eq!(
            config.parser_options().week_eleven,
            WeekElevenPolicy::AlwaysExclude
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut config: ScrapeConfig = serde_json::from_str(
            r#"{"url": "http://x/", "term": "1", "year": 2024, "output": "o.json"}"#,
        )
        .unwrap();

        config.window = 0;
        assert!(matches!(config.validate(), Err(ScrapeError::Config { .. })));

        config.window = 4;
        config.url = "nope".to_string();
        assert!(matches!(config.validate(), Err(ScrapeError::Url { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let names_path = dir.path().join("courses.json");
        fs::write(&names_path, r#"{"COMP1511": "Programming Fundamentals"}"#).unwrap();

        let config_path = dir.path().join(".config.json");
        let mut file = fs::File::create(&config_path).unwrap();
        write!(
            file,
            r#"{{"url": "http://x/", "term": "1", "year": 2024, "output": "o.json", "course_names": {:?}}}"#,
            names_path.to_str().unwrap()
        )
        .unwrap();

        let config = ScrapeConfig::load(&config_path).unwrap();
        let names = config.load_course_names().unwrap();
        assert_eq!(names["COMP1511"], "Programming Fundamentals");
    }
}
