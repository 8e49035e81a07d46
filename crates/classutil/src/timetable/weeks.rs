//! Week bitmask and the week-range grammar used by the class listings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of teaching weeks tracked per term.
pub const WEEKS_IN_TERM: u8 = 13;

/// Week that the listings use as an out-of-term placeholder.
pub const PLACEHOLDER_WEEK: u8 = 11;

/// Set of active weeks in a term, one bit per week (bit `n - 1` is week `n`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekSet(u16);

impl WeekSet {
    const FULL_MASK: u16 = (1 << WEEKS_IN_TERM) - 1;

    /// Creates an empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a set containing every week of the term.
    pub const fn all() -> Self {
        Self(Self::FULL_MASK)
    }

    /// Creates a set from a raw bitmask, dropping bits outside the term.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::FULL_MASK)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Adds a week. Returns false if the week lies outside the term.
    pub fn insert(&mut self, week: u8) -> bool {
        if !(1..=WEEKS_IN_TERM).contains(&week) {
            return false;
        }
        self.0 |= 1 << (week - 1);
        true
    }

    pub fn remove(&mut self, week: u8) {
        if (1..=WEEKS_IN_TERM).contains(&week) {
            self.0 &= !(1 << (week - 1));
        }
    }

    pub fn contains(self, week: u8) -> bool {
        (1..=WEEKS_IN_TERM).contains(&week) && self.0 & (1 << (week - 1)) != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if the set holds exactly one week and it is `week`.
    pub fn is_only(self, week: u8) -> bool {
        self.len() == 1 && self.contains(week)
    }

    /// Iterates the active weeks in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (1..=WEEKS_IN_TERM).filter(move |&w| self.contains(w))
    }
}

impl FromIterator<u8> for WeekSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = WeekSet::empty();
        for week in iter {
            set.insert(week);
        }
        set
    }
}

/// Renders the set in the listing's compact form, e.g. `1-5,7-10`.
impl fmt::Display for WeekSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut run: Option<(u8, u8)> = None;

        for week in self.iter() {
            run = match run {
                Some((start, end)) if end + 1 == week => Some((start, week)),
                Some(prev) => {
                    parts.push(prev);
                    Some((week, week))
                }
                None => Some((week, week)),
            };
        }
        parts.extend(run);

        let rendered: Vec<String> = parts
            .into_iter()
            .map(|(a, b)| if a == b { a.to_string() } else { format!("{a}-{b}") })
            .collect();
        write!(f, "{}", rendered.join(","))
    }
}

impl FromStr for WeekSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(expand_weeks(s))
    }
}

/// Expands a comma-separated list of week tokens into a set.
///
/// `a-b` expands to every week from `a` to `b` inclusive, a bare number
/// to itself. Tokens that do not parse, and weeks outside the term,
/// contribute nothing.
pub fn expand_weeks(spec: &str) -> WeekSet {
    let mut set = WeekSet::empty();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((a, b)) => {
                if let (Ok(a), Ok(b)) = (a.trim().parse::<u8>(), b.trim().parse::<u8>()) {
                    for week in a..=b {
                        set.insert(week);
                    }
                }
            }
            None => {
                if let Ok(week) = token.parse::<u8>() {
                    set.insert(week);
                }
            }
        }
    }

    set
}
