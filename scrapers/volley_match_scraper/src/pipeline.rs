//! One ingestion run: fetch every source, build records, dedupe on the
//! natural key, upsert the batch.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    builder::MatchRecordBuilder,
    error::Result,
    fetch::HtmlFetcher,
    sources::{SourceAdapter, SourceReport},
    store::{dedupe_by_natural_key, MatchStore},
    types::{MatchRecord, RawMatch, SourceKind},
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: SourceKind,
    pub matches: usize,
    pub failed_units: usize,
    pub degraded_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub sources: Vec<SourceSummary>,
    pub invalid_records: usize,
    pub duplicates_collapsed: usize,
    pub records: Vec<MatchRecord>,
    pub rows_written: u64,
}

pub struct IngestionPipeline<F: HtmlFetcher, S: MatchStore> {
    fetcher: F,
    store: S,
    sources: Vec<SourceAdapter>,
}

impl<F: HtmlFetcher, S: MatchStore> IngestionPipeline<F, S> {
    pub fn new(fetcher: F, store: S, sources: Vec<SourceAdapter>) -> Self {
        Self {
            fetcher,
            store,
            sources,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sources run one after the other; a source that fails contributes
    /// nothing. Only a store failure fails the run.
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();

        let mut reports = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let report = source.collect(&self.fetcher).await;
            info!(
                "Source {}: {} matches, {} failed pages, {} estimated kickoffs",
                report.source,
                report.matches.len(),
                report.failed_units,
                report.degraded_records
            );
            reports.push(report);
        }

        let summaries = reports.iter().map(summarize).collect();
        let (records, invalid_records) =
            build_records(reports.into_iter().flat_map(|report| report.matches));
        let built = records.len();
        let records = dedupe_by_natural_key(records);
        let duplicates_collapsed = built - records.len();
        if duplicates_collapsed > 0 {
            info!("Collapsed {} records sharing a natural key", duplicates_collapsed);
        }

        let rows_written = if records.is_empty() {
            warn!("No club matches found in any source, nothing to save");
            0
        } else {
            info!("Saving {} matches", records.len());
            match self.store.upsert_matches(&records).await {
                Ok(rows) => {
                    info!("Store synchronised ({} rows upserted)", rows);
                    rows
                }
                Err(e) => {
                    error!("Store rejected the batch: {}", e);
                    return Err(e);
                }
            }
        };

        info!("Ingestion run finished in {} ms", started.elapsed().as_millis());

        Ok(RunReport {
            sources: summaries,
            invalid_records,
            duplicates_collapsed,
            records,
            rows_written,
        })
    }
}

fn summarize(report: &SourceReport) -> SourceSummary {
    SourceSummary {
        source: report.source,
        matches: report.matches.len(),
        failed_units: report.failed_units,
        degraded_records: report.degraded_records,
    }
}

/// Builds every raw match, logging and counting the ones that fail.
pub fn build_records(matches: impl IntoIterator<Item = RawMatch>) -> (Vec<MatchRecord>, usize) {
    let mut records = Vec::new();
    let mut invalid = 0;
    for raw in matches {
        match MatchRecordBuilder::build(raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Dropping record: {}", e);
                invalid += 1;
            }
        }
    }
    (records, invalid)
}
