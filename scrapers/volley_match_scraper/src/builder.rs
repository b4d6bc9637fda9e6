use crate::{
    error::{Result, ScrapeError},
    types::{MatchRecord, MatchStatus, RawMatch},
    utils::collapse_whitespace,
};

/// Shapes adapter output into the persisted record, whichever site it came from.
pub struct MatchRecordBuilder;

impl MatchRecordBuilder {
    pub fn build(raw: RawMatch) -> Result<MatchRecord> {
        let home_team = collapse_whitespace(&raw.home_team);
        let away_team = collapse_whitespace(&raw.away_team);
        if home_team.is_empty() || away_team.is_empty() {
            return Err(ScrapeError::invalid_record(format!(
                "missing team name ({:?} vs {:?})",
                raw.home_team, raw.away_team
            )));
        }

        let (home_score, away_score) = match raw.status {
            MatchStatus::Completed => (raw.home_score.unwrap_or(0), raw.away_score.unwrap_or(0)),
            MatchStatus::Scheduled => (0, 0),
        };
        if home_score < 0 || away_score < 0 {
            return Err(ScrapeError::invalid_record(format!(
                "negative score {}-{} for {} vs {}",
                home_score, away_score, home_team, away_team
            )));
        }

        Ok(MatchRecord {
            home_team,
            away_team,
            kickoff_at: raw.kickoff.at,
            kickoff_estimated: raw.kickoff.is_estimated(),
            home_score,
            away_score,
            championship_label: collapse_whitespace(&raw.championship_label),
            status: raw.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Kickoff, SourceKind};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn raw(status: MatchStatus, home: Option<i32>, away: Option<i32>) -> RawMatch {
        RawMatch {
            source: SourceKind::Listing,
            home_team: "  Volley   Club ".to_string(),
            away_team: "Altura".to_string(),
            home_score: home,
            away_score: away,
            status,
            championship_label: "1a Divisione Maschile".to_string(),
            kickoff: Kickoff::parsed(
                NaiveDate::from_ymd_opt(2025, 11, 8).unwrap().and_hms_opt(18, 0, 0).unwrap(),
            ),
        }
    }

    #[test]
    fn test_completed_keeps_scores() {
        let record = MatchRecordBuilder::build(raw(MatchStatus::Completed, Some(3), Some(2))).unwrap();
        assert_eq!(record.home_team, "Volley Club");
        assert_eq!((record.home_score, record.away_score), (3, 2));
        assert!(!record.kickoff_estimated);
    }

    #[test]
    fn test_scores_default_to_zero() {
        let record = MatchRecordBuilder::build(raw(MatchStatus::Completed, None, Some(3))).unwrap();
        assert_eq!((record.home_score, record.away_score), (0, 3));

        let record = MatchRecordBuilder::build(raw(MatchStatus::Scheduled, Some(1), None)).unwrap();
        assert_eq!((record.home_score, record.away_score), (0, 0));
        assert_eq!(record.status, MatchStatus::Scheduled);
    }

    #[test]
    fn test_rejects_blank_team() {
        let mut blank = raw(MatchStatus::Scheduled, None, None);
        blank.away_team = "   ".to_string();
        assert!(MatchRecordBuilder::build(blank).is_err());
    }

    #[test]
    fn test_estimated_kickoff_is_flagged() {
        let mut estimated = raw(MatchStatus::Scheduled, None, None);
        estimated.kickoff = Kickoff::fallback_now();
        assert!(MatchRecordBuilder::build(estimated).unwrap().kickoff_estimated);
    }
}
