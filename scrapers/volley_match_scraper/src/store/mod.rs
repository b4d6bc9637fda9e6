pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::{
    error::Result,
    types::{MatchRecord, NaturalKey},
};

pub use memory::InMemoryMatchStore;
pub use postgres::PgMatchStore;

/// Tabular store the rest of the site reads matches from.
#[allow(async_fn_in_trait)]
pub trait MatchStore {
    /// Writes the whole batch or nothing. Rows whose natural key already
    /// exists are updated, new keys are inserted, nothing is deleted.
    /// Returns the number of rows written.
    async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<u64>;
}

impl<S: MatchStore> MatchStore for &S {
    async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<u64> {
        (**self).upsert_matches(records).await
    }
}

/// Collapses records sharing a natural key; the last one seen wins and keeps
/// the position of the first.
pub fn dedupe_by_natural_key(records: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut positions: HashMap<NaturalKey, usize> = HashMap::new();
    let mut unique: Vec<MatchRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = record.natural_key();
        match positions.get(&key) {
            Some(&idx) => unique[idx] = record,
            None => {
                positions.insert(key, unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

/// Identifies an undated fixture across runs. Its stand-in kickoff changes
/// every run, so the stored one is looked up by teams and championship.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EstimatedKey {
    pub home_team: String,
    pub away_team: String,
    pub championship_label: String,
}

impl EstimatedKey {
    pub fn of(record: &MatchRecord) -> Self {
        Self {
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            championship_label: record.championship_label.clone(),
        }
    }
}

/// Moves estimated records onto the kickoff already stored for the same
/// undated fixture, then collapses any key the move made collide.
pub fn pin_estimated_kickoffs(
    records: &[MatchRecord],
    stored: &HashMap<EstimatedKey, NaiveDateTime>,
) -> Vec<MatchRecord> {
    let pinned = records
        .iter()
        .cloned()
        .map(|mut record| {
            if record.kickoff_estimated {
                if let Some(&kickoff_at) = stored.get(&EstimatedKey::of(&record)) {
                    record.kickoff_at = kickoff_at;
                }
            }
            record
        })
        .collect();
    dedupe_by_natural_key(pinned)
}
