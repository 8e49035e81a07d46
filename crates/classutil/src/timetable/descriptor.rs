//! Parser for the free-text timetable descriptors found in the class listings.
//!
//! A descriptor looks like `Mon 14:00-16:00 (w1-5,7-10, Quad G040)` and may
//! repeat several meetings joined by `"; "`. Anything the parser cannot
//! place on the Monday-Friday grid is dropped rather than reported.

use super::types::{ClassTime, Day};
use super::weeks::{expand_weeks, WeekSet, PLACEHOLDER_WEEK};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Separator between meetings of a single stream.
const SEGMENT_SEPARATOR: &str = "; ";

/// Rewrites applied, in order, to the day/time token before it is read.
///
/// Weekend days are mapped too, so the weekend check below sees `S`/`s`.
const TOKEN_RULES: &[(&str, &str)] = &[
    ("Mon ", "M"),
    ("Tue ", "T"),
    ("Wed ", "W"),
    ("Thu ", "H"),
    ("Fri ", "F"),
    ("Sat ", "S"),
    ("Sun ", "s"),
    (":30", ".5"),
    (":00", ""),
];

/// Time given by the listing when the real time is unknown.
const UNKNOWN_TIME: &str = "00-00";

static VARIANT_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/odd|/even|Comb/w.*").unwrap());
static OUT_OF_TERM_WEEKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*1|-?N[0-9]+").unwrap());
static WEEK_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",[, ]*").unwrap());
static DECIMAL_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,2}(?:\.5)?$").unwrap());

/// How week 11 is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekElevenPolicy {
    /// Drop a meeting only when week 11 is the only week it runs.
    #[default]
    RejectIfOnly,
    /// Never count week 11 as a teaching week.
    AlwaysExclude,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    #[serde(default)]
    pub week_eleven: WeekElevenPolicy,
}

/// Turns raw descriptors into [`ClassTime`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorParser {
    options: ParserOptions,
}

impl DescriptorParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parses a full descriptor.
    ///
    /// Returns an empty list when the descriptor has no usable meeting.
    /// Repeated meetings with the same day and hours are collapsed to the
    /// first one.
    pub fn parse(&self, raw: &str) -> Vec<ClassTime> {
        let cleaned = VARIANT_MARKERS.replace_all(raw, "");
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return Vec::new();
        }

        if !cleaned.contains(SEGMENT_SEPARATOR) {
            return self.parse_segment(cleaned).into_iter().collect();
        }

        let mut seen = HashSet::new();
        cleaned
            .split(SEGMENT_SEPARATOR)
            .filter_map(|segment| self.parse_segment(segment.trim()))
            .filter(|time| seen.insert(time.slot_key()))
            .collect()
    }

    /// Parses one meeting, e.g. `Tue 09:30-11:30 (w1-10, Room 2)`.
    fn parse_segment(&self, segment: &str) -> Option<ClassTime> {
        let (head, bracket) = split_bracket(segment);

        let Some((day, start, end, can_clash)) = parse_time_token(&normalise_token(head)) else {
            debug!(segment = %segment, "Skipping segment with no usable day/time");
            return None;
        };

        let (weeks, location) = match bracket {
            Some(inner) => (parse_weeks(inner), extract_location(inner)),
            None => (WeekSet::all(), String::new()),
        };

        let Some(weeks) = self.apply_week_eleven(weeks) else {
            debug!(segment = %segment, "Skipping segment outside term weeks");
            return None;
        };

        Some(ClassTime {
            day,
            start,
            end,
            weeks,
            location,
            can_clash,
        })
    }

    /// Applies the week-11 policy to a resolved week set.
    ///
    /// Returns `None` when no teaching week is left.
    fn apply_week_eleven(&self, mut weeks: WeekSet) -> Option<WeekSet> {
        match self.options.week_eleven {
            WeekElevenPolicy::RejectIfOnly if weeks.is_only(PLACEHOLDER_WEEK) => return None,
            WeekElevenPolicy::RejectIfOnly => {}
            WeekElevenPolicy::AlwaysExclude => weeks.remove(PLACEHOLDER_WEEK),
        }

        (!weeks.is_empty()).then_some(weeks)
    }
}

/// Parses a descriptor with the default options.
pub fn parse_descriptor(raw: &str) -> Vec<ClassTime> {
    DescriptorParser::default().parse(raw)
}

/// Splits a segment into the text before `(` and the bracket contents.
///
/// An unclosed bracket runs to the end of the segment.
fn split_bracket(segment: &str) -> (&str, Option<&str>) {
    match segment.find('(') {
        Some(open) => {
            let after = &segment[open + 1..];
            let inner = after.find(')').map_or(after, |close| &after[..close]);
            (segment[..open].trim(), Some(inner))
        }
        None => (segment.trim(), None),
    }
}

/// Reads the week field at the start of a bracket.
///
/// A bracket without a week field means every week of the term.
fn parse_weeks(inner: &str) -> WeekSet {
    let field = inner
        .split(", ")
        .next()
        .unwrap_or_default()
        .trim_matches(|c| c == ',' || c == ' ');

    let Some(spec) = field.strip_prefix("wks").or_else(|| field.strip_prefix('w')) else {
        return WeekSet::all();
    };

    let spec = OUT_OF_TERM_WEEKS.replace_all(spec, "");
    let spec = WEEK_SEPARATORS.replace_all(&spec, ",");
    expand_weeks(spec.trim_matches(|c| c == ',' || c == ' '))
}

fn normalise_token(token: &str) -> String {
    TOKEN_RULES
        .iter()
        .fold(token.trim().to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern, replacement)
        })
}

/// Reads a normalised token such as `M14-16`, `H9.5-11#` or `F10`.
fn parse_time_token(token: &str) -> Option<(Day, f64, f64, bool)> {
    if token.is_empty() || token == UNKNOWN_TIME {
        return None;
    }

    // Weekends, and intensives spanning several days ("Mon-F9-17").
    if token.starts_with(['S', 's']) || token.chars().take(2).all(char::is_alphabetic) {
        return None;
    }

    let first = token.chars().next()?;
    let day = Day::from_letter(first)?;
    let rest = token[first.len_utf8()..].trim();

    let (rest, can_clash) = match rest.strip_suffix('#') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (rest, false),
    };

    if rest == UNKNOWN_TIME {
        return None;
    }

    let (start, end) = match rest.split_once('-') {
        Some((start, end)) => (parse_hour(start)?, parse_hour(end)?),
        None => {
            let start = parse_hour(rest)?;
            (start, start + 1.0)
        }
    };

    (start < end && end <= 24.0).then_some((day, start, end, can_clash))
}

/// Parses `14`, `09`, `14.5` or `14:15` into a decimal hour.
///
/// Only whole and half hours are accepted without a colon.
fn parse_hour(text: &str) -> Option<f64> {
    let text = text.trim();
    let hour = match text.split_once(':') {
        Some((h, m)) => {
            let h: u8 = h.parse().ok()?;
            let m: u8 = m.parse().ok()?;
            if m >= 60 {
                return None;
            }
            f64::from(h) + f64::from(m) / 60.0
        }
        None if DECIMAL_HOUR.is_match(text) => text.parse::<f64>().ok()?,
        None => return None,
    };

    (hour.is_finite() && (0.0..=24.0).contains(&hour)).then_some(hour)
}

fn extract_location(inner: &str) -> String {
    let location = match inner.find(", ") {
        Some(comma) => &inner[comma..],
        // No room ever starts with a lowercase 'w'; that is a week field.
        None if !inner.starts_with('w') => inner,
        None => "",
    };
    let location = location.trim_matches(|c| c == ',' || c == ' ');

    if location.eq_ignore_ascii_case("see school") {
        String::new()
    } else {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weeks(time: &ClassTime) -> Vec<u8> {
        time.weeks.iter().collect()
    }

    #[test]
    fn test_parse_full_descriptor() {
        let times = parse_descriptor("Mon 14:00-16:00 (w1-5,7-10, Building A)");
        assert_eq!(times.len(), 1);

        let time = &times[0];
        assert_eq!(time.day, Day::Mon);
        assert_eq!(time.start, 14.0);
        assert_eq!(time.end, 16.0);
        assert_eq!(weeks(time), vec![1, 2, 3, 4, 5, 7, 8, 9, 10]);
        assert_eq!(time.location, "Building A");
        assert!(!time.can_clash);
    }

    #[test]
    fn test_parse_half_hours_without_location() {
        let times = parse_descriptor("Tue 09:30-11:30 (w1-10)");
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].day, Day::Tue);
        assert_eq!(times[0].start, 9.5);
        assert_eq!(times[0].end, 11.5);
        assert_eq!(times[0].location, "");
    }

    #[test]
    fn test_parse_listing_short_form() {
        let times = parse_descriptor("Thu 09-11 (w2-13, Quad G040)");
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].day, Day::Thu);
        assert_eq!(times[0].start, 9.0);
        assert_eq!(times[0].end, 11.0);
        assert_eq!(weeks(&times[0]), (2..=13).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_rejects_weekends_and_intensives() {
        assert!(parse_descriptor("Sat 10:00-12:00 (w1-5)").is_empty());
        assert!(parse_descriptor("Sun 10-12").is_empty());
        assert!(parse_descriptor("Mon-Fri 09-17 (w1)").is_empty());
        assert!(parse_descriptor("Mon, Wed 10-12 (w1-10)").is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_time() {
        assert!(parse_descriptor("00-00 (w1-10)").is_empty());
        assert!(parse_descriptor("Mon 00-00 (w1-10)").is_empty());
    }

    #[test]
    fn test_parse_empty_and_variant_only() {
        assert!(parse_descriptor("").is_empty());
        assert!(parse_descriptor("   ").is_empty());
        assert!(parse_descriptor("/odd").is_empty());
        assert!(parse_descriptor("Comb/w COMP9021").is_empty());
    }

    #[test]
    fn test_parse_strips_variant_markers() {
        let times = parse_descriptor("Wed 12-14/odd (w1-9, Room 1) Comb/w ABCD1234");
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].day, Day::Wed);
        assert_eq!(times[0].location, "Room 1");
    }

    #[test]
    fn test_parse_collapses_duplicate_segments() {
        let times = parse_descriptor(
            "Mon 14:00-16:00 (w1-5, Room A); Mon 14:00-16:00 (w1-5, Room A)",
        );
        assert_eq!(times.len(), 1);
    }

    #[test]
    fn test_parse_keeps_first_of_same_slot_in_other_room() {
        let times = parse_descriptor("Fri 10-12 (w1-5, Room A); Fri 10-12 (w6-10, Room B)");
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].location, "Room A");
        assert_eq!(weeks(&times[0]), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parse_multiple_meetings_in_order() {
        let times = parse_descriptor("Mon 10-12 (w1-10, A); Sat 10-12 (w1-10, B); Wed 9-10 (w1-10, C)");
        let days: Vec<Day> = times.iter().map(|t| t.day).collect();
        assert_eq!(days, vec![Day::Mon, Day::Wed]);
    }

    #[test]
    fn test_parse_out_of_term_weeks() {
        assert!(parse_descriptor("Mon 10-12 (w< 1)").is_empty());
        assert!(parse_descriptor("Mon 10-12 (wN1,N2, Room)").is_empty());
        assert!(parse_descriptor("Mon 10-12 (w11)").is_empty());

        let times = parse_descriptor("Mon 10-12 (w< 1,1-3,N1, Room)");
        assert_eq!(weeks(&times[0]), vec![1, 2, 3]);
        assert_eq!(times[0].location, "Room");

        let times = parse_descriptor("Mon 10-12 (w8-10-N2)");
        assert_eq!(weeks(&times[0]), vec![8, 9, 10]);
    }

    #[test]
    fn test_week_eleven_policy() {
        let lenient = DescriptorParser::default();
        let times = lenient.parse("Mon 10-12 (w10-11)");
        assert_eq!(weeks(&times[0]), vec![10, 11]);

        let strict = DescriptorParser::new(ParserOptions {
            week_eleven: WeekElevenPolicy::AlwaysExclude,
        });
        let times = strict.parse("Mon 10-12 (w10-11)");
        assert_eq!(weeks(&times[0]), vec![10]);
        assert!(strict.parse("Mon 10-12 (w11)").is_empty());
    }

    #[test]
    fn test_week_eleven_excluded_without_week_field() {
        let strict = DescriptorParser::new(ParserOptions {
            week_eleven: WeekElevenPolicy::AlwaysExclude,
        });

        for descriptor in ["Wed 15-17", "Wed 15-17 (Mathews 102)", "Wed 15-17 (w1-13)"] {
            let times = strict.parse(descriptor);
            assert_eq!(times.len(), 1, "{descriptor}");
            assert!(!times[0].weeks.contains(PLACEHOLDER_WEEK), "{descriptor}");
            assert_eq!(times[0].weeks.len(), 12, "{descriptor}");
        }

        let times = DescriptorParser::default().parse("Wed 15-17 (Mathews 102)");
        assert!(times[0].weeks.contains(PLACEHOLDER_WEEK));
        assert_eq!(times[0].location, "Mathews 102");
    }

    #[test]
    fn test_hour_must_be_plain_decimal() {
        assert!(parse_descriptor("Mon 1e1-12 (w1)").is_empty());
        assert!(parse_descriptor("Mon 10-1e1 (w1)").is_empty());
        assert!(parse_descriptor("Mon +9-10 (w1)").is_empty());
        assert!(parse_descriptor("Mon 9.25-10 (w1)").is_empty());

        let times = parse_descriptor("Mon 09:30-11 (w1)");
        assert_eq!((times[0].start, times[0].end), (9.5, 11.0));
    }

    #[test]
    fn test_bracket_without_weeks_means_all_weeks() {
        let times = parse_descriptor("Wed 15-17 (Mathews 102)");
        assert_eq!(times[0].weeks, WeekSet::all());
        assert_eq!(times[0].location, "Mathews 102");

        let times = parse_descriptor("Wed 15-17");
        assert_eq!(times[0].weeks, WeekSet::all());
        assert_eq!(times[0].location, "");
    }

    #[test]
    fn test_see_school_location_is_blank() {
        let times = parse_descriptor("Fri 13-14 (w1-10, See School)");
        assert_eq!(times[0].location, "");
        let times = parse_descriptor("Fri 13-14 (see school)");
        assert_eq!(times[0].location, "");
    }

    #[test]
    fn test_can_clash_marker_and_single_hour() {
        let times = parse_descriptor("Thu 18# (w1-10, Online)");
        assert_eq!(times[0].day, Day::Thu);
        assert_eq!(times[0].start, 18.0);
        assert_eq!(times[0].end, 19.0);
        assert!(times[0].can_clash);
    }

    #[test]
    fn test_reversed_or_garbage_times_are_dropped() {
        assert!(parse_descriptor("Mon 16-14 (w1-10)").is_empty());
        assert!(parse_descriptor("Mon ab-cd (w1-10)").is_empty());
        assert!(parse_descriptor("Mon 10-25 (w1-10)").is_empty());
    }

    #[test]
    fn test_unclosed_bracket() {
        let times = parse_descriptor("Tue 10-11 (w1-3, Red Centre");
        assert_eq!(times[0].location, "Red Centre");
        assert_eq!(weeks(&times[0]), vec![1, 2, 3]);
    }

    #[test]
    fn test_normalise_token_applies_rules_in_order() {
        assert_eq!(normalise_token("Mon 14:00-16:30"), "M14-16.5");
        assert_eq!(normalise_token("Thu 09:30-10:00"), "H09.5-10");
        assert_eq!(normalise_token("Sat 10-12"), "S10-12");
    }
}
