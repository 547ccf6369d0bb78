use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Enums ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Tour,
    Classics,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TourSize {
    Grand,
    Minor,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl GroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::Tour => "tour",
            GroupType::Classics => "classics",
        }
    }
}

impl TourSize {
    pub fn as_str(self) -> &'static str {
        match self {
            TourSize::Grand => "grand",
            TourSize::Minor => "minor",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TourSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Groups ────────────────────────────────────────────────────────────────────

/// A link found under "All Contests". `url` is the raw href.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveredGroup {
    pub name: String,
    pub gender: Gender,
    pub url: String,
}

/// A classified group with an absolute URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitionGroup {
    pub name: String,
    pub gender: Gender,
    pub url: String,
    pub group_type: GroupType,
}

// ── Breakdown items ───────────────────────────────────────────────────────────

/// One multi-stage race inside a tour group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TourStage {
    pub url: String,
    pub description: String,
    pub stage_count: u32,
    pub tour_size: TourSize,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

/// One row of a classics group's race table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassicRace {
    pub ordinal: String,
    pub date: NaiveDateTime,
    pub name: String,
    pub category: char,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum Breakdown {
    Tours(Vec<TourStage>),
    Classics(Vec<ClassicRace>),
}

impl Breakdown {
    pub fn len(&self) -> usize {
        match self {
            Breakdown::Tours(stages) => stages.len(),
            Breakdown::Classics(races) => races.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn group_type(&self) -> GroupType {
        match self {
            Breakdown::Tours(_) => GroupType::Tour,
            Breakdown::Classics(_) => GroupType::Classics,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupBreakdown {
    pub group: CompetitionGroup,
    pub breakdown: Breakdown,
}

/// Result of processing one discovered group: its breakdown plus any groups
/// found embedded in its page.
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub breakdown: GroupBreakdown,
    pub spawned: Vec<CompetitionGroup>,
}

// ── Flat calendar rows ────────────────────────────────────────────────────────

/// One dated event of the season, whatever kind of group it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarEntry {
    pub group: String,
    pub gender: Gender,
    pub group_type: GroupType,
    pub name: String,
    pub start: String,
    pub end: String,
    /// Tour size for tours, category code for classics.
    pub class: String,
    pub url: String,
}
