//! Decides whether a fixture involves the club and which of its rosters
//! (championships) it belongs to.
//!
//! Matching is plain case-insensitive substring containment against the
//! configured aliases. Aliases are checked longest first, so a specific
//! variant such as `ROSSO Volley Club TS` wins over the shorter
//! `Volley Club TS` it contains.

use tracing::debug;

use crate::config::{ClubAlias, ClubConfig};

/// Label used by the regional tables when nothing narrows it down.
pub const DEFAULT_REGIONAL_LABEL: &str = "Serie D";
pub const SERIE_D_FEMALE: &str = "Serie D Femminile";
pub const SERIE_D_MALE: &str = "Serie D Maschile";

const FEMALE_MARKERS: &[&str] = &["f", "femm", "femminile"];
const MALE_MARKERS: &[&str] = &["m", "masc", "masch", "maschile"];

#[derive(Debug, Clone)]
struct NormalizedAlias {
    needle: String,
    implied_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClubIdentity {
    aliases: Vec<NormalizedAlias>,
}

/// Outcome of reading a results-table caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionClass {
    Category(String),
    /// Championship ingested from the provincial source instead.
    Excluded,
    Unknown,
}

impl ClubIdentity {
    pub fn new(aliases: &[ClubAlias]) -> Self {
        let mut aliases: Vec<NormalizedAlias> = aliases
            .iter()
            .filter(|alias| !alias.name.trim().is_empty())
            .map(|alias| NormalizedAlias {
                needle: alias.name.trim().to_lowercase(),
                implied_category: alias.implied_category.clone(),
            })
            .collect();
        // Stable sort keeps configuration order for equal lengths.
        aliases.sort_by(|a, b| b.needle.chars().count().cmp(&a.needle.chars().count()));
        Self { aliases }
    }

    pub fn from_config(config: &ClubConfig) -> Self {
        Self::new(&config.aliases)
    }

    /// True when either side of the fixture carries one of the club's aliases.
    pub fn is_club(&self, home_team: &str, away_team: &str) -> bool {
        self.matching_alias(home_team, away_team).is_some()
    }

    /// Championship implied by the most specific alias found in the fixture.
    pub fn implied_category(&self, home_team: &str, away_team: &str) -> Option<&str> {
        let home = home_team.to_lowercase();
        let away = away_team.to_lowercase();
        self.aliases
            .iter()
            .filter(|alias| alias.implied_category.is_some())
            .find(|alias| home.contains(&alias.needle) || away.contains(&alias.needle))
            .and_then(|alias| alias.implied_category.as_deref())
    }

    /// Championship label for a regional table row: the caption wins when it
    /// is explicit, excluded captions yield `None`, anything else falls back
    /// to the aliases.
    pub fn classify_regional(
        &self,
        caption: &str,
        home_team: &str,
        away_team: &str,
    ) -> Option<String> {
        match classify_caption(caption) {
            CaptionClass::Category(label) => Some(label),
            CaptionClass::Excluded => {
                debug!("Caption {:?} belongs to the provincial source, skipping", caption);
                None
            }
            CaptionClass::Unknown => Some(
                self.implied_category(home_team, away_team)
                    .unwrap_or(DEFAULT_REGIONAL_LABEL)
                    .to_string(),
            ),
        }
    }

    fn matching_alias(&self, home_team: &str, away_team: &str) -> Option<&NormalizedAlias> {
        let home = home_team.to_lowercase();
        let away = away_team.to_lowercase();
        self.aliases
            .iter()
            .find(|alias| home.contains(&alias.needle) || away.contains(&alias.needle))
    }
}

pub fn classify_caption(caption: &str) -> CaptionClass {
    let lowered = caption.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(pos) = words.windows(2).position(|pair| pair == ["serie", "d"]) {
        // First gender word after "serie d" decides; later ones name groups.
        for word in &words[pos + 2..] {
            if FEMALE_MARKERS.contains(word) {
                return CaptionClass::Category(SERIE_D_FEMALE.to_string());
            }
            if MALE_MARKERS.contains(word) {
                return CaptionClass::Category(SERIE_D_MALE.to_string());
            }
        }
    }

    if words.iter().any(|w| is_provincial_marker(w)) {
        return CaptionClass::Excluded;
    }

    CaptionClass::Unknown
}

fn is_provincial_marker(word: &str) -> bool {
    if matches!(word, "div" | "divisione" | "under") {
        return true;
    }
    // Age grades written as u13, u17, ...
    word.strip_prefix('u')
        .map(|age| !age.is_empty() && age.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
