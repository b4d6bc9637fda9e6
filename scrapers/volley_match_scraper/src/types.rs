use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(MatchStatus::Scheduled),
            "completed" => Some(MatchStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KickoffSource {
    /// Read from the source page.
    Parsed,
    /// The page had no usable date; scrape time stands in.
    Fallback,
}

/// Local kickoff time as published by the federation sites.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Kickoff {
    pub at: NaiveDateTime,
    pub source: KickoffSource,
}

impl Kickoff {
    pub fn parsed(at: NaiveDateTime) -> Self {
        Self {
            at,
            source: KickoffSource::Parsed,
        }
    }

    /// Current local time truncated to the minute.
    pub fn fallback_now() -> Self {
        let now = Local::now().naive_local();
        let at = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        Self {
            at,
            source: KickoffSource::Fallback,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.source == KickoffSource::Fallback
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Listing,
    Tabular,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Listing => f.write_str("listing"),
            SourceKind::Tabular => f.write_str("tabular"),
        }
    }
}

/// What a source adapter hands to the record builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub source: SourceKind,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: MatchStatus,
    pub championship_label: String,
    pub kickoff: Kickoff,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub kickoff_at: NaiveDateTime,
    pub kickoff_estimated: bool,
    pub home_score: i32,
    pub away_score: i32,
    pub championship_label: String,
    pub status: MatchStatus,
}

/// Upsert conflict target: `(home_team, away_team, kickoff_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NaturalKey {
    pub home_team: String,
    pub away_team: String,
    pub kickoff_at: NaiveDateTime,
}

impl MatchRecord {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            kickoff_at: self.kickoff_at,
        }
    }
}
