//! HTML traversal of the index and faculty listing pages.

use crate::timetable::{RawRow, RawStreamRow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

// Static selectors for parsing - compiled once
static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Position of the course table among the page's tables.
const COURSE_TABLE_INDEX: usize = 2;

const TABLE_END_CELLS: usize = 1;
const COURSE_HEADING_CELLS: usize = 2;
const CLASS_ROW_CELLS: usize = 8;

/// Extracts the rows of the course table on a faculty page.
///
/// The header row is skipped. Rows of a width other than the end marker,
/// a course heading or a class row are ignored.
pub fn parse_faculty_page(html: &str) -> Vec<RawRow> {
    let document = Html::parse_document(html);

    let Some(table) = document.select(&TABLE_SELECTOR).nth(COURSE_TABLE_INDEX) else {
        return Vec::new();
    };

    table
        .select(&ROW_SELECTOR)
        .filter(|row| owning_table(row) == Some(table))
        .skip(1)
        .filter_map(|row| classify_row(&row))
        .collect()
}

/// Finds the faculty page links for a term, in page order.
///
/// Faculty pages are named like `COMP_T1.html` (or `COMP_S1.html` for
/// older semester listings).
pub fn find_faculty_links(html: &str, term: &str) -> Vec<String> {
    let pattern = format!(r"[A-Y][A-Z]{{3}}_[ST]{}\.html$", regex::escape(term));
    let Ok(link_regex) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter(|href| link_regex.is_match(href))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// Nearest enclosing `<table>` of a row.
fn owning_table<'a>(row: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn classify_row(row: &ElementRef) -> Option<RawRow> {
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .map(|cell| cell_text(&cell))
        .collect();

    match cells.len() {
        TABLE_END_CELLS => Some(RawRow::End),
        COURSE_HEADING_CELLS => Some(RawRow::Heading {
            code: cells[0].clone(),
            name: cells[1].clone(),
        }),
        CLASS_ROW_CELLS => Some(RawRow::Class(RawStreamRow {
            component: cells[0].clone(),
            section: cells[1].clone(),
            status: cells[4].clone(),
            enrolment: cells[5].clone(),
            descriptor: cells[7].clone(),
        })),
        _ => None,
    }
}

/// Visible text of a cell with `&nbsp;` and runs of whitespace collapsed.
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACULTY_PAGE: &str = r#"
        <html><body>
        <table><tr><td>banner</td></tr></table>
        <table><tr><td>nav</td><td>links</td></tr></table>
        <table>
          <tr><td>Comp</td><td>Sect</td><td>Class</td><td>Type</td><td>Status</td><td>Enr/Cap</td><td>%</td><td>Times</td></tr>
          <tr><td class="cucourse">COMP1511</td><td class="cucourse">Programming Fundamentals (T1A)</td></tr>
          <tr class="rowLowlight">
            <td>LEC</td><td>A</td><td>5001</td><td>IN</td><td>Open*</td><td>300/400&nbsp;</td><td>75%</td>
            <td>Mon 14-16 (w1-5,7-10, Clancy)</td>
          </tr>
          <tr class="rowHighlight">
            <td>TUT</td><td>T1</td><td>5002</td><td>IN</td><td>Full</td><td>20/20</td><td>100%</td>
            <td><table><tr><td>Tue
                9-10 (w2-10, Quad 1042)</td></tr></table></td>
          </tr>
          <tr><td>odd</td><td>row</td><td>width</td></tr>
          <tr><td>end</td></tr>
          <tr><td>COMP9999</td><td>After End</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_faculty_page() {
        let rows = parse_faculty_page(FACULTY_PAGE);
        assert_eq!(rows.len(), 5);

        assert_eq!(
            rows[0],
            RawRow::Heading {
                code: "COMP1511".to_string(),
                name: "Programming Fundamentals (T1A)".to_string(),
            }
        );

        let RawRow::Class(lecture) = &rows[1] else {
            panic!("expected a class row, got {:?}", rows[1]);
        };
        assert_eq!(lecture.component, "LEC");
        assert_eq!(lecture.status, "Open*");
        assert_eq!(lecture.enrolment, "300/400");
        assert_eq!(lecture.descriptor, "Mon 14-16 (w1-5,7-10, Clancy)");

        let RawRow::Class(tutorial) = &rows[2] else {
            panic!("expected a class row, got {:?}", rows[2]);
        };
        assert_eq!(tutorial.descriptor, "Tue 9-10 (w2-10, Quad 1042)");

        assert_eq!(rows[3], RawRow::End);
    }

    #[test]
    fn test_page_without_course_table() {
        assert!(parse_faculty_page("<html><table><tr><td>x</td></tr></table></html>").is_empty());
    }

    #[test]
    fn test_find_faculty_links() {
        let index = r#"
            <a href="COMP_T1.html">COMP</a>
            <a href="ACCT_T1.html">ACCT</a>
            <a href="COMP_T2.html">COMP T2</a>
            <a href="ZZZZ_T1.html">bad faculty</a>
            <a href="COMP_T1.html">dup</a>
            <a href="MATH_S1.html">MATH</a>
            <a>no href</a>
        "#;

        assert_eq!(
            find_faculty_links(index, "1"),
            vec!["COMP_T1.html", "ACCT_T1.html", "MATH_S1.html"]
        );
        assert_eq!(find_faculty_links(index, "2"), vec!["COMP_T2.html"]);
    }
}
