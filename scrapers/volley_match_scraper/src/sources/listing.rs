//! Provincial portal, mobile view: one results list per championship, each
//! entry linking to a detail page that carries the kickoff date and time.

use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::{debug, error, info, warn};

use crate::{
    config::{Championship, ListingSourceConfig},
    dates::{parse_detail_text, resolve_kickoff},
    error::{Result, ScrapeError},
    fetch::HtmlFetcher,
    identity::ClubIdentity,
    types::{Kickoff, MatchStatus, RawMatch, SourceKind},
    utils::{element_text_excluding, first_text, selector},
};

use super::SourceReport;

/// One `a.gara` entry of a results list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub home_team: String,
    pub away_team: String,
    /// Sets won, empty until the match is played.
    pub home_sets: String,
    pub away_sets: String,
    pub detail_href: Option<String>,
}

impl ListingEntry {
    pub fn status(&self) -> MatchStatus {
        if !self.home_sets.is_empty() && !self.away_sets.is_empty() {
            MatchStatus::Completed
        } else {
            MatchStatus::Scheduled
        }
    }
}

pub fn parse_listing(html: &str) -> Result<Vec<ListingEntry>> {
    let document = Html::parse_document(html);
    let entry_selector = selector("a.gara")?;
    let home_selector = selector(".squadraCasa")?;
    let away_selector = selector(".squadraOspite")?;
    let home_sets_selector = selector(".setCasa")?;
    let away_sets_selector = selector(".setOspite")?;

    let team_name = |entry: &ElementRef, team: &scraper::Selector, sets: &scraper::Selector| {
        entry
            .select(team)
            .next()
            .map(|node| element_text_excluding(&node, sets))
            .unwrap_or_default()
    };

    let entries = document
        .select(&entry_selector)
        .map(|entry| ListingEntry {
            home_team: team_name(&entry, &home_selector, &home_sets_selector),
            away_team: team_name(&entry, &away_selector, &away_sets_selector),
            home_sets: first_text(&entry, &home_sets_selector),
            away_sets: first_text(&entry, &away_sets_selector),
            detail_href: entry
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string),
        })
        .collect();

    Ok(entries)
}

/// Full rendered text of a detail page, text nodes separated by spaces.
pub fn detail_page_text(html: &str) -> String {
    Html::parse_document(html)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct ListingSource {
    config: ListingSourceConfig,
    identity: ClubIdentity,
    category_pause: Duration,
}

impl ListingSource {
    pub fn new(config: ListingSourceConfig, identity: ClubIdentity, category_pause: Duration) -> Self {
        Self {
            config,
            identity,
            category_pause,
        }
    }

    pub async fn collect<F: HtmlFetcher>(&self, fetcher: &F) -> SourceReport {
        let mut report = SourceReport::new(SourceKind::Listing);

        for (idx, championship) in self.config.championships.iter().enumerate() {
            if idx > 0 && !self.category_pause.is_zero() {
                tokio::time::sleep(self.category_pause).await;
            }

            match self.collect_championship(fetcher, championship, &mut report).await {
                Ok(count) => info!("[{}] Found {} club matches", championship.name, count),
                Err(e) => {
                    error!(
                        "[{}] Failed to scrape championship {}: {}",
                        championship.name, championship.id, e
                    );
                    report.failed_units += 1;
                }
            }
        }

        report
    }

    async fn collect_championship<F: HtmlFetcher>(
        &self,
        fetcher: &F,
        championship: &Championship,
        report: &mut SourceReport,
    ) -> Result<usize> {
        let url = self.config.list_url(championship.id);
        info!("[{}] Scraping {}", championship.name, url);
        let html = fetcher.fetch_html(&url).await?;
        let entries = parse_listing(&html)?;
        debug!("[{}] {} entries on list page", championship.name, entries.len());

        let mut count = 0;
        for entry in entries {
            if !self.identity.is_club(&entry.home_team, &entry.away_team) {
                continue;
            }

            let kickoff = self.kickoff_for(fetcher, &entry, report).await;
            let status = entry.status();
            report.matches.push(RawMatch {
                source: SourceKind::Listing,
                home_score: entry.home_sets.parse().ok(),
                away_score: entry.away_sets.parse().ok(),
                home_team: entry.home_team,
                away_team: entry.away_team,
                status,
                championship_label: championship.name.clone(),
                kickoff,
            });
            count += 1;
        }

        Ok(count)
    }

    async fn kickoff_for<F: HtmlFetcher>(
        &self,
        fetcher: &F,
        entry: &ListingEntry,
        report: &mut SourceReport,
    ) -> Kickoff {
        let context = format!("{} vs {}", entry.home_team, entry.away_team);
        let Some(href) = entry.detail_href.as_deref() else {
            report.degraded_records += 1;
            let missing = ScrapeError::invalid_record("entry has no detail link");
            return resolve_kickoff(Err(missing), &context);
        };

        let url = self.config.detail_url(href);
        let parsed = match fetcher.fetch_html(&url).await {
            Ok(html) => parse_detail_text(&detail_page_text(&html)),
            Err(e) => {
                warn!("Detail page {} unavailable: {}", url, e);
                Err(e)
            }
        };
        if parsed.is_err() {
            report.degraded_records += 1;
        }
        resolve_kickoff(parsed, &context)
    }
}
