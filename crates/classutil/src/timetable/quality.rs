//! Data-quality findings gathered while building courses.
//!
//! Nothing in here stops a scrape. The report is returned alongside the
//! courses so the caller can decide what to do with it.

use super::types::Course;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub streams_accepted: usize,
    pub streams_rejected: usize,
    /// Raw enrolment cells that did not parse
    pub malformed_enrolments: Vec<String>,
    /// (course code, section) of streams with more enrolled than capacity
    pub over_enrolled: Vec<(String, String)>,
    /// (course code, component) whose streams disagree on class durations
    pub inconsistent_durations: Vec<(String, String)>,
}

impl QualityReport {
    pub fn merge(&mut self, other: QualityReport) {
        self.streams_accepted += other.streams_accepted;
        self.streams_rejected += other.streams_rejected;
        self.malformed_enrolments.extend(other.malformed_enrolments);
        self.over_enrolled.extend(other.over_enrolled);
        self.inconsistent_durations.extend(other.inconsistent_durations);
    }

    /// True if anything suggests the listing format has drifted.
    pub fn has_issues(&self) -> bool {
        !self.malformed_enrolments.is_empty()
            || !self.over_enrolled.is_empty()
            || !self.inconsistent_durations.is_empty()
    }

    pub fn record_malformed_enrolment(&mut self, course: &str, text: &str) {
        warn!(course = %course, text = %text, "Malformed enrolment text");
        self.malformed_enrolments.push(text.to_string());
    }

    /// Records over-enrolled streams of a course.
    pub fn check_enrolments(&mut self, course: &Course) {
        for stream in course.streams.iter().filter(|s| s.is_over_enrolled()) {
            warn!(
                course = %course.code,
                section = %stream.section,
                enrolled = stream.enrolled,
                capacity = stream.capacity,
                "Stream is over capacity"
            );
            self.over_enrolled
                .push((course.code.clone(), stream.section.clone()));
        }
    }

    /// Checks that consecutive streams of a component share class durations.
    ///
    /// Only the first disagreement per run of a component is recorded.
    pub fn check_durations(&mut self, course: &Course) {
        let mut last_component: Option<&str> = None;
        let mut last_durations: Option<Vec<f64>> = None;
        let mut flagged = false;

        for stream in &course.streams {
            if last_component != Some(stream.component.as_str()) {
                last_component = Some(stream.component.as_str());
                last_durations = None;
                flagged = false;
            }

            if stream.is_web || flagged {
                continue;
            }

            let mut durations: Vec<f64> = stream.times.iter().map(|t| t.duration()).collect();
            durations.sort_by(f64::total_cmp);

            if let Some(previous) = &last_durations {
                if *previous != durations {
                    warn!(
                        course = %course.code,
                        component = %stream.component,
                        expected = ?previous,
                        found = ?durations,
                        "Inconsistent stream durations"
                    );
                    self.inconsistent_durations
                        .push((course.code.clone(), stream.component.clone()));
                    flagged = true;
                    continue;
                }
            }
            last_durations = Some(durations);
        }
    }
}
