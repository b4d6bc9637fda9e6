pub mod listing;
pub mod tabular;

use std::time::Duration;

use crate::{
    config::ScraperConfig,
    fetch::HtmlFetcher,
    identity::ClubIdentity,
    types::{RawMatch, SourceKind},
};

pub use listing::ListingSource;
pub use tabular::TabularSource;

/// What one adapter produced during a run.
#[derive(Debug)]
pub struct SourceReport {
    pub source: SourceKind,
    pub matches: Vec<RawMatch>,
    /// Pages (a championship list, the regional page) that could not be scraped.
    pub failed_units: usize,
    /// Records kept with an estimated kickoff.
    pub degraded_records: usize,
}

impl SourceReport {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            matches: Vec::new(),
            failed_units: 0,
            degraded_records: 0,
        }
    }
}

/// The federation sites the club's fixtures are published on.
pub enum SourceAdapter {
    Listing(ListingSource),
    Tabular(TabularSource),
}

impl SourceAdapter {
    /// Provincial championships first, then the regional page.
    pub fn all_from_config(config: &ScraperConfig) -> Vec<SourceAdapter> {
        let identity = ClubIdentity::from_config(&config.club);
        vec![
            SourceAdapter::Listing(ListingSource::new(
                config.sources.listing.clone(),
                identity.clone(),
                Duration::from_millis(config.rate_limits.category_pause_ms),
            )),
            SourceAdapter::Tabular(TabularSource::new(config.sources.tabular.clone(), identity)),
        ]
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceAdapter::Listing(_) => SourceKind::Listing,
            SourceAdapter::Tabular(_) => SourceKind::Tabular,
        }
    }

    /// Never fails: unreachable pages are logged and counted in the report.
    pub async fn collect<F: HtmlFetcher>(&self, fetcher: &F) -> SourceReport {
        match self {
            SourceAdapter::Listing(source) => source.collect(fetcher).await,
            SourceAdapter::Tabular(source) => source.collect(fetcher).await,
        }
    }
}
