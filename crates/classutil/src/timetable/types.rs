/// Types for normalised timetable data
use super::weeks::WeekSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Teaching day. Weekend classes are never represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    #[serde(rename = "M")]
    Mon,
    #[serde(rename = "T")]
    Tue,
    #[serde(rename = "W")]
    Wed,
    /// `H` rather than `T`, which is taken by Tuesday.
    #[serde(rename = "H")]
    Thu,
    #[serde(rename = "F")]
    Fri,
}

impl Day {
    /// Single-letter code used in the normalised time token.
    pub fn letter(self) -> char {
        match self {
            Day::Mon => 'M',
            Day::Tue => 'T',
            Day::Wed => 'W',
            Day::Thu => 'H',
            Day::Fri => 'F',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'M' => Some(Day::Mon),
            'T' => Some(Day::Tue),
            'W' => Some(Day::Wed),
            'H' => Some(Day::Thu),
            'F' => Some(Day::Fri),
            _ => None,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One weekly meeting of a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTime {
    pub day: Day,
    /// Decimal hour, e.g. `14.5` for 14:30
    pub start: f64,
    pub end: f64,
    pub weeks: WeekSet,
    /// Empty when the listing gives no usable room
    pub location: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub can_clash: bool,
}

/// Identity of a meeting slot, ignoring weeks and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    day: Day,
    start: u64,
    end: u64,
}

impl ClassTime {
    /// Key used to decide whether two meetings are the same slot.
    ///
    /// Hours are compared bit-for-bit; they always come out of the same
    /// parser so equal slots produce equal floats.
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            start: self.start.to_bits(),
            end: self.end.to_bits(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_online(&self) -> bool {
        self.location
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .collect::<String>()
            .trim()
            .eq_ignore_ascii_case("online")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamStatus {
    Open,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    InPerson,
    Online,
    Mixed,
}

/// One offered instance of a course component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    /// e.g. LEC, TUT, LAB
    pub component: String,
    pub section: String,
    pub status: StreamStatus,
    pub enrolled: u32,
    pub capacity: u32,
    pub times: Vec<ClassTime>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_web: bool,
    pub delivery: DeliveryMode,
}

impl Stream {
    /// Enrolled over capacity. Capacity is never zero for a built stream.
    pub fn fill_ratio(&self) -> f64 {
        f64::from(self.enrolled) / f64::from(self.capacity)
    }

    pub fn is_over_enrolled(&self) -> bool {
        self.enrolled > self.capacity
    }

    /// Ordered meeting slots, or `None` for web streams.
    pub fn time_signature(&self) -> Option<Vec<SlotKey>> {
        if self.is_web {
            None
        } else {
            Some(self.times.iter().map(ClassTime::slot_key).collect())
        }
    }
}

/// Student career a course is offered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Career {
    Undergraduate,
    Postgraduate,
    Research,
}

impl Career {
    /// Reads the career marker from a course-level row's descriptor text.
    pub fn from_descriptor(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("ugrd") {
            Some(Career::Undergraduate)
        } else if lower.contains("pgrd") {
            Some(Career::Postgraduate)
        } else if lower.contains("rsch") {
            Some(Career::Research)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career: Option<Career>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub streams: Vec<Stream>,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            term: None,
            career: None,
            section: None,
            streams: Vec::new(),
        }
    }
}
