use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use chrono::NaiveDateTime;

use crate::{
    error::{Result, ScrapeError},
    types::{MatchRecord, NaturalKey},
};

use super::{pin_estimated_kickoffs, EstimatedKey, MatchStore};

/// Process-local store with the same upsert rules as the database table.
/// Backs dry runs and tests.
#[derive(Default)]
pub struct InMemoryMatchStore {
    rows: Mutex<BTreeMap<NaturalKey, MatchRecord>>,
    reject_next: AtomicBool,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `upsert_matches` call fail without writing anything.
    pub fn reject_next_batch(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &NaturalKey) -> Option<MatchRecord> {
        self.lock().get(key).cloned()
    }

    /// Rows ordered by kickoff, then teams.
    pub fn records(&self) -> Vec<MatchRecord> {
        let mut records: Vec<MatchRecord> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| {
            a.kickoff_at
                .cmp(&b.kickoff_at)
                .then_with(|| a.home_team.cmp(&b.home_team))
                .then_with(|| a.away_team.cmp(&b.away_team))
        });
        records
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<NaturalKey, MatchRecord>> {
        // A poisoned map is still consistent: writes happen after validation.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MatchStore for InMemoryMatchStore {
    async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<u64> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(ScrapeError::Store {
                records: records.len(),
                message: "batch rejected".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.natural_key()) {
                return Err(ScrapeError::Store {
                    records: records.len(),
                    message: format!(
                        "batch touches {} vs {} at {} twice",
                        record.home_team, record.away_team, record.kickoff_at
                    ),
                });
            }
        }

        let mut rows = self.lock();
        let mut stored: HashMap<EstimatedKey, NaiveDateTime> = HashMap::new();
        for row in rows.values().filter(|row| row.kickoff_estimated) {
            stored
                .entry(EstimatedKey::of(row))
                .and_modify(|at| *at = row.kickoff_at.min(*at))
                .or_insert(row.kickoff_at);
        }

        let pinned = pin_estimated_kickoffs(records, &stored);
        for record in &pinned {
            rows.insert(record.natural_key(), record.clone());
        }
        Ok(pinned.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchStatus;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(status: MatchStatus, score: (i32, i32)) -> MatchRecord {
        MatchRecord {
            home_team: "Volley Club TS".to_string(),
            away_team: "Udine".to_string(),
            kickoff_at: NaiveDate::from_ymd_opt(2026, 2, 24).unwrap().and_hms_opt(20, 30, 0).unwrap(),
            kickoff_estimated: false,
            home_score: score.0,
            away_score: score.1,
            championship_label: "Serie D Femminile".to_string(),
            status,
        }
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = InMemoryMatchStore::new();
        let scheduled = record(MatchStatus::Scheduled, (0, 0));
        let completed = record(MatchStatus::Completed, (3, 1));

        tokio_test::block_on(store.upsert_matches(&[scheduled.clone()])).unwrap();
        tokio_test::block_on(store.upsert_matches(&[completed.clone()])).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&scheduled.natural_key()), Some(completed));
    }

    #[test]
    fn test_undated_fixture_keeps_its_first_kickoff() {
        let store = InMemoryMatchStore::new();
        let mut first = record(MatchStatus::Scheduled, (0, 0));
        first.kickoff_estimated = true;
        let mut later = first.clone();
        later.kickoff_at = first.kickoff_at + chrono::Duration::days(1);

        tokio_test::block_on(store.upsert_matches(&[first.clone()])).unwrap();
        tokio_test::block_on(store.upsert_matches(&[later])).unwrap();

        assert_eq!(store.records(), vec![first]);
    }

    #[test]
    fn test_rejected_batch_writes_nothing() {
        let store = InMemoryMatchStore::new();
        store.reject_next_batch();

        let result = tokio_test::block_on(store.upsert_matches(&[record(MatchStatus::Scheduled, (0, 0))]));

        assert!(matches!(result, Err(ScrapeError::Store { records: 1, .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_duplicate_keys_in_one_batch_are_rejected() {
        let store = InMemoryMatchStore::new();
        let batch = [record(MatchStatus::Scheduled, (0, 0)), record(MatchStatus::Completed, (3, 0))];

        assert!(tokio_test::block_on(store.upsert_matches(&batch)).is_err());
        assert!(store.is_empty());
    }
}
