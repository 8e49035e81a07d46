/// Course assembly from the rows of a faculty listing
use super::descriptor::DescriptorParser;
use super::quality::QualityReport;
use super::stream::{build_stream, parse_status, RawStreamRow, COURSE_MARKER};
use super::types::{Career, Course};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static TERM_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(([A-Z][A-Z0-9]{2})\)$").unwrap());

/// One row of a faculty listing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRow {
    /// Marks the end of the course table
    End,
    /// Course code and abridged name
    Heading { code: String, name: String },
    Class(RawStreamRow),
}

/// Splits a trailing term marker such as ` (T1A)` off a course name.
pub fn split_term(raw_name: &str) -> (String, Option<String>) {
    match TERM_SUFFIX.captures(raw_name) {
        Some(caps) => {
            let whole = caps.get(0).map_or(raw_name.len(), |m| m.start());
            let term = caps.get(1).map(|m| m.as_str().to_string());
            (raw_name[..whole].to_string(), term)
        }
        None => (raw_name.to_string(), None),
    }
}

/// Builds courses from listing rows in table order.
pub struct CourseAssembler<'a> {
    parser: &'a DescriptorParser,
    courses: Vec<Course>,
    report: QualityReport,
    heading: Option<(String, String)>,
    /// A heading was seen and no course has been opened for it yet
    pending: bool,
    finished: bool,
}

impl<'a> CourseAssembler<'a> {
    pub fn new(parser: &'a DescriptorParser) -> Self {
        Self {
            parser,
            courses: Vec::new(),
            report: QualityReport::default(),
            heading: None,
            pending: false,
            finished: false,
        }
    }

    /// Feeds one row. Rows after the end marker are ignored.
    pub fn push(&mut self, row: RawRow) {
        if self.finished {
            return;
        }

        match row {
            RawRow::End => {
                self.flush_pending();
                self.finished = true;
            }
            RawRow::Heading { code, name } => {
                self.flush_pending();
                self.heading = Some((code, name));
                self.pending = true;
            }
            RawRow::Class(row) if row.component == COURSE_MARKER => {
                // Course enrolment row: opens the course with its career.
                if parse_status(&row.status).is_none() {
                    return;
                }
                self.open_course(Some(&row));
            }
            RawRow::Class(row) => {
                if self.pending {
                    self.open_course(None);
                }
                self.push_stream(&row);
            }
        }
    }

    pub fn finish(mut self) -> (Vec<Course>, QualityReport) {
        self.flush_pending();
        (self.courses, self.report)
    }

    /// A heading with no active class rows still becomes an empty course.
    fn flush_pending(&mut self) {
        if self.pending {
            self.open_course(None);
        }
    }

    fn open_course(&mut self, marker: Option<&RawStreamRow>) {
        let Some((code, raw_name)) = &self.heading else {
            debug!("Course enrolment row before any course heading");
            return;
        };

        let (name, term) = split_term(raw_name);
        let mut course = Course::new(code.clone(), name);
        course.term = term;
        if let Some(marker) = marker {
            course.career = Career::from_descriptor(&marker.descriptor);
            course.section = Some(marker.section.clone()).filter(|s| !s.is_empty());
        }

        self.courses.push(course);
        self.pending = false;
    }

    fn push_stream(&mut self, row: &RawStreamRow) {
        let Some(course) = self.courses.last_mut() else {
            debug!(section = %row.section, "Class row before any course heading");
            return;
        };

        match build_stream(row, self.parser) {
            Ok(stream) => {
                self.report.streams_accepted += 1;
                course.streams.push(stream);
            }
            Err(rejection) => {
                self.report.streams_rejected += 1;
                if rejection.is_data_quality_issue() {
                    self.report.record_malformed_enrolment(&course.code, &row.enrolment);
                } else {
                    debug!(
                        course = %course.code,
                        section = %row.section,
                        reason = %rejection,
                        "Dropping stream"
                    );
                }
            }
        }
    }
}

/// Assembles every course in a sequence of rows.
pub fn assemble_courses(
    rows: impl IntoIterator<Item = RawRow>,
    parser: &DescriptorParser,
) -> (Vec<Course>, QualityReport) {
    let mut assembler = CourseAssembler::new(parser);
    for row in rows {
        assembler.push(row);
    }
    assembler.finish()
}

/// Replaces abridged course names with full names where known.
pub fn apply_full_names(courses: &mut [Course], full_names: &HashMap<String, String>) {
    for course in courses {
        if let Some(name) = full_names.get(&course.code) {
            course.name = name.clone();
        }
    }
}
