//! Regional portal: a single page with one results table per championship,
//! each captioned with the championship name.

use scraper::Html;
use tracing::{debug, error, info};

use crate::{
    config::{TabularColumns, TabularSourceConfig},
    dates::{parse_table_cell, resolve_kickoff},
    error::Result,
    fetch::HtmlFetcher,
    identity::ClubIdentity,
    types::{MatchStatus, RawMatch, SourceKind},
    utils::{element_text, first_text, parse_score, selector},
};

use super::SourceReport;

#[derive(Debug, Default)]
pub struct TabularParse {
    pub matches: Vec<RawMatch>,
    /// Club rows left to the provincial source.
    pub excluded_rows: usize,
}

/// Result cell to `(home, away, status)`. Anything that is not a number
/// pair means the match has not been played yet.
pub fn parse_result_cell(result: &str) -> (i32, i32, MatchStatus) {
    match parse_score(result) {
        Ok((home, away)) => (home, away, MatchStatus::Completed),
        Err(_) => (0, 0, MatchStatus::Scheduled),
    }
}

pub fn parse_results_page(
    html: &str,
    columns: &TabularColumns,
    identity: &ClubIdentity,
) -> Result<TabularParse> {
    let document = Html::parse_document(html);
    let table_selector = selector("table.tbl-risultati")?;
    let caption_selector = selector("caption")?;
    let row_selector = selector("tbody tr")?;
    let cell_selector = selector("td")?;

    let required = columns.date.max(columns.home).max(columns.away) + 1;
    let mut parsed = TabularParse::default();

    for table in document.select(&table_selector) {
        let caption = first_text(&table, &caption_selector);
        debug!("Results table {:?}", caption);

        for row in table.select(&row_selector) {
            let cells: Vec<String> = row.select(&cell_selector).map(|cell| element_text(&cell)).collect();
            if cells.len() < required {
                continue;
            }

            let home_team = &cells[columns.home];
            let away_team = &cells[columns.away];
            if !identity.is_club(home_team, away_team) {
                continue;
            }

            let Some(championship_label) = identity.classify_regional(&caption, home_team, away_team)
            else {
                parsed.excluded_rows += 1;
                continue;
            };

            let result = cells.get(columns.result).map(String::as_str).unwrap_or_default();
            let (home_score, away_score, status) = parse_result_cell(result);
            let kickoff = resolve_kickoff(
                parse_table_cell(&cells[columns.date]),
                &format!("{} vs {}", home_team, away_team),
            );

            parsed.matches.push(RawMatch {
                source: SourceKind::Tabular,
                home_team: home_team.clone(),
                away_team: away_team.clone(),
                home_score: Some(home_score),
                away_score: Some(away_score),
                status,
                championship_label,
                kickoff,
            });
        }
    }

    Ok(parsed)
}

pub struct TabularSource {
    config: TabularSourceConfig,
    identity: ClubIdentity,
}

impl TabularSource {
    pub fn new(config: TabularSourceConfig, identity: ClubIdentity) -> Self {
        Self { config, identity }
    }

    pub fn parse(&self, html: &str) -> Result<TabularParse> {
        parse_results_page(html, &self.config.columns, &self.identity)
    }

    pub async fn collect<F: HtmlFetcher>(&self, fetcher: &F) -> SourceReport {
        let mut report = SourceReport::new(SourceKind::Tabular);
        info!("[regional] Scraping {}", self.config.url);

        let parsed = match fetcher.fetch_html(&self.config.url).await {
            Ok(html) => self.parse(&html),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(parsed) => {
                report.degraded_records += parsed
                    .matches
                    .iter()
                    .filter(|m| m.kickoff.is_estimated())
                    .count();
                info!(
                    "[regional] Found {} club matches ({} rows left to the provincial source)",
                    parsed.matches.len(),
                    parsed.excluded_rows
                );
                report.matches = parsed.matches;
            }
            Err(e) => {
                error!("[regional] Failed to scrape {}: {}", self.config.url, e);
                report.failed_units += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClubConfig, types::KickoffSource};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn identity() -> ClubIdentity {
        ClubIdentity::from_config(&ClubConfig::default())
    }

    fn table(caption: &str, rows: &[[&str; 4]]) -> String {
        let rows: String = rows
            .iter()
            .map(|[date, home, away, result]| {
                format!(
                    "<tr><td>1</td><td>A</td><td>{date}</td><td>{home}</td><td>{away}</td><td>{result}</td></tr>"
                )
            })
            .collect();
        format!(
            r#"<table class="tbl-risultati"><caption>{caption}</caption>
               <thead><tr><th>N</th><th>G</th><th>Data</th><th>Casa</th><th>Ospite</th><th>Ris</th></tr></thead>
               <tbody>{rows}</tbody></table>"#
        )
    }

    #[test]
    fn test_parse_result_cell() {
        assert_eq!(parse_result_cell("3-1"), (3, 1, MatchStatus::Completed));
        assert_eq!(parse_result_cell(""), (0, 0, MatchStatus::Scheduled));
        assert_eq!(parse_result_cell("-"), (0, 0, MatchStatus::Scheduled));
        assert_eq!(parse_result_cell("rinv."), (0, 0, MatchStatus::Scheduled));
    }

    #[test]
    fn test_caption_decides_category() {
        let html = format!(
            "<html><body>{}</body></html>",
            table("Serie D F", &[["24/02/26 20:30", "Volley Club TS", "Udine", "3-1"]])
        );
        let parsed = parse_results_page(&html, &TabularColumns::default(), &identity()).unwrap();

        assert_eq!(parsed.matches.len(), 1);
        let m = &parsed.matches[0];
        assert_eq!(m.home_team, "Volley Club TS");
        assert_eq!(m.away_team, "Udine");
        assert_eq!((m.home_score, m.away_score), (Some(3), Some(1)));
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.championship_label, "Serie D Femminile");
        assert_eq!(m.kickoff.source, KickoffSource::Parsed);
        assert_eq!(
            m.kickoff.at,
            NaiveDate::from_ymd_opt(2026, 2, 24).unwrap().and_hms_opt(20, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_provincial_tables_are_skipped() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            table("1 Div. M", &[["01/03/26 18:00", "Volley Club", "Altura", ""]]),
            table("Under 17 M", &[["02/03/26 18:00", "Sloga", "Volley Club", ""]]),
        );
        let parsed = parse_results_page(&html, &TabularColumns::default(), &identity()).unwrap();

        assert!(parsed.matches.is_empty());
        assert_eq!(parsed.excluded_rows, 2);
    }

    #[test]
    fn test_other_teams_and_short_rows_are_ignored() {
        let html = r#"<html><body><table class="tbl-risultati"><caption>Serie D M</caption><tbody>
            <tr><td>1</td><td>A</td><td>24/02/26 20:30</td><td>Udine</td><td>Pordenone</td><td>3-0</td></tr>
            <tr><td>Riposa</td><td>ROSSO Volley Club TS</td></tr>
            <tr><td>2</td><td>A</td><td>25/02/26 21:00</td><td>Sacile</td><td>ROSSO Volley Club TS</td></tr>
        </tbody></table></body></html>"#;
        let parsed = parse_results_page(html, &TabularColumns::default(), &identity()).unwrap();

        assert_eq!(parsed.matches.len(), 1);
        let m = &parsed.matches[0];
        assert_eq!(m.away_team, "ROSSO Volley Club TS");
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!((m.home_score, m.away_score), (Some(0), Some(0)));
        assert_eq!(m.championship_label, "Serie D Maschile");
    }

    #[test]
    fn test_unknown_caption_uses_alias_category() {
        let html = format!(
            "<html><body>{}</body></html>",
            table("Campionato regionale", &[["24/02/26 20:30", "Udine", "ROSSO Volley Club TS", "n.d."]])
        );
        let parsed = parse_results_page(&html, &TabularColumns::default(), &identity()).unwrap();
        assert_eq!(parsed.matches[0].championship_label, "Serie D Maschile");
        assert_eq!(parsed.matches[0].status, MatchStatus::Scheduled);
    }
}
