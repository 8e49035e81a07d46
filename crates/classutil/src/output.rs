/// Output document written after a scrape
use crate::error::ScrapeError;
use crate::timetable::Course;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// When and for which term the data was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub term: String,
    pub year: u16,
    /// `dd/mm/YYYY` in campus time
    pub update_date: String,
    /// `HH:MM` in campus time
    pub update_time: String,
}

impl Meta {
    /// Stamps the current time in the given campus offset.
    ///
    /// Offsets outside ±23 hours fall back to UTC.
    pub fn now(term: impl Into<String>, year: u16, utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self::at(term, year, Utc::now().with_timezone(&offset))
    }

    pub fn at(term: impl Into<String>, year: u16, time: DateTime<FixedOffset>) -> Self {
        Self {
            term: term.into(),
            year,
            update_date: time.format("%d/%m/%Y").to_string(),
            update_time: time.format("%H:%M").to_string(),
        }
    }
}

/// The full output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutput {
    pub courses: Vec<Course>,
    pub meta: Meta,
}

impl ScrapeOutput {
    pub fn to_json(&self) -> Result<String, ScrapeError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Writes the output document as compact JSON.
pub async fn write_output(path: &Path, output: &ScrapeOutput) -> Result<(), ScrapeError> {
    let json = output.to_json()?;
    tokio::fs::write(path, &json).await?;

    info!(
        path = %path.display(),
        courses = output.courses.len(),
        bytes = json.len(),
        "Wrote output"
    );
    Ok(())
}
