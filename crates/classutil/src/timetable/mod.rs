//! Timetable normalisation: descriptor parsing, stream filtering and
//! duplicate stream removal.
//!
//! Everything in this module is pure and synchronous. Courses never share
//! state, so callers are free to process them in parallel.

mod course;
mod descriptor;
mod quality;
mod reconcile;
mod stream;
mod types;
mod weeks;

pub use course::{apply_full_names, assemble_courses, split_term, CourseAssembler, RawRow};
pub use descriptor::{parse_descriptor, DescriptorParser, ParserOptions, WeekElevenPolicy};
pub use quality::QualityReport;
pub use reconcile::StreamReconciler;
pub use stream::{build_stream, parse_enrolment, parse_status, RawStreamRow, StreamRejection};
pub use types::*;
pub use weeks::{expand_weeks, WeekSet, PLACEHOLDER_WEEK, WEEKS_IN_TERM};

use tracing::info;

/// Turns listing rows into reconciled courses.
///
/// Builds the courses, removes duplicate streams, then runs the
/// over-enrolment and duration checks on what remains.
pub fn process_rows(
    rows: impl IntoIterator<Item = RawRow>,
    parser: &DescriptorParser,
) -> (Vec<Course>, QualityReport) {
    let (mut courses, mut report) = assemble_courses(rows, parser);

    let removed = StreamReconciler::new().reconcile_all(&mut courses);

    for course in &courses {
        report.check_enrolments(course);
        report.check_durations(course);
    }

    info!(
        courses = courses.len(),
        accepted = report.streams_accepted,
        rejected = report.streams_rejected,
        duplicates = removed,
        "Processed listing rows"
    );

    (courses, report)
}
