//! Turns one scraped class row into a [`Stream`], or says why it can't.

use super::descriptor::DescriptorParser;
use super::types::{DeliveryMode, Stream, StreamStatus};
use thiserror::Error;

/// Component code of the course-level enrolment row.
pub const COURSE_MARKER: &str = "CRS";

const WEB_MARKER: &str = "WEB";

/// The five text cells of a class row, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStreamRow {
    pub component: String,
    pub section: String,
    pub status: String,
    pub enrolment: String,
    pub descriptor: String,
}

/// Reasons a row does not become a stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamRejection {
    /// Course-level enrolment marker, not a class
    #[error("course enrolment row")]
    CourseMarker,

    /// Closed, cancelled, tentative or stopped
    #[error("inactive status: {status}")]
    InactiveStatus { status: String },

    /// Enrolment cell did not look like `<enrolled>/<capacity>`
    #[error("malformed enrolment text: {text:?}")]
    MalformedEnrolment { text: String },

    #[error("stream has zero capacity")]
    ZeroCapacity,

    /// Not a web stream and no meeting survived parsing
    #[error("no usable meeting times")]
    NoUsableTimes,
}

impl StreamRejection {
    /// Returns true if this rejection points at a change in the listing format
    /// rather than ordinary data the scraper is meant to skip.
    pub fn is_data_quality_issue(&self) -> bool {
        matches!(self, StreamRejection::MalformedEnrolment { .. })
    }
}

/// Maps a status cell to a stream status, ignoring a trailing `*`.
pub fn parse_status(raw: &str) -> Option<StreamStatus> {
    match raw.trim().trim_end_matches('*') {
        "Open" => Some(StreamStatus::Open),
        "Full" => Some(StreamStatus::Full),
        _ => None,
    }
}

/// Reads `(enrolled, capacity)` from text such as `45/50 [Waitlist 3]`.
pub fn parse_enrolment(raw: &str) -> Result<(u32, u32), StreamRejection> {
    let malformed = || StreamRejection::MalformedEnrolment {
        text: raw.to_string(),
    };

    let token = raw.split_whitespace().next().ok_or_else(malformed)?;
    let (enrolled, capacity) = token.split_once('/').ok_or_else(malformed)?;
    let enrolled = enrolled.parse().map_err(|_| malformed())?;
    let capacity = capacity.parse().map_err(|_| malformed())?;

    Ok((enrolled, capacity))
}

/// Builds a stream from a row, applying the filter rules in order.
pub fn build_stream(
    row: &RawStreamRow,
    parser: &DescriptorParser,
) -> Result<Stream, StreamRejection> {
    if row.component == COURSE_MARKER {
        return Err(StreamRejection::CourseMarker);
    }

    let status = parse_status(&row.status).ok_or_else(|| StreamRejection::InactiveStatus {
        status: row.status.clone(),
    })?;

    let (enrolled, capacity) = parse_enrolment(&row.enrolment)?;
    if capacity == 0 {
        return Err(StreamRejection::ZeroCapacity);
    }

    if row.section.contains(WEB_MARKER) {
        let component = if row.component == WEB_MARKER {
            "LEC".to_string()
        } else {
            row.component.clone()
        };

        return Ok(Stream {
            component,
            section: row.section.clone(),
            status,
            enrolled,
            capacity,
            times: Vec::new(),
            is_web: true,
            delivery: DeliveryMode::Online,
        });
    }

    let times = parser.parse(&row.descriptor);
    if times.is_empty() {
        return Err(StreamRejection::NoUsableTimes);
    }

    let online = times.iter().filter(|t| t.is_online()).count();
    let delivery = if online == times.len() {
        DeliveryMode::Online
    } else if online == 0 {
        DeliveryMode::InPerson
    } else {
        DeliveryMode::Mixed
    };

    Ok(Stream {
        component: row.component.clone(),
        section: row.section.clone(),
        status,
        enrolled,
        capacity,
        times,
        is_web: false,
        delivery,
    })
}
