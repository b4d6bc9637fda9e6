use std::collections::HashMap;

use chrono::NaiveDateTime;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use tracing::{debug, info};

use crate::{
    config::DatabaseConfig,
    error::{Result, ScrapeError},
    types::{MatchRecord, MatchStatus},
};

use super::{pin_estimated_kickoffs, EstimatedKey, MatchStore};

const UPSERT_MATCHES: &str = r#"
    INSERT INTO matches (
        home_team, away_team, kickoff_at, kickoff_estimated,
        home_score, away_score, championship_label, status
    )
    SELECT * FROM UNNEST(
        $1::text[], $2::text[], $3::timestamp[], $4::bool[],
        $5::int4[], $6::int4[], $7::text[], $8::text[]
    )
    ON CONFLICT (home_team, away_team, kickoff_at) DO UPDATE
    SET kickoff_estimated = EXCLUDED.kickoff_estimated,
        home_score = EXCLUDED.home_score,
        away_score = EXCLUDED.away_score,
        championship_label = EXCLUDED.championship_label,
        status = EXCLUDED.status,
        updated_at = NOW()
"#;

const SELECT_ESTIMATED_KICKOFFS: &str = r#"
    SELECT m.home_team, m.away_team, m.championship_label, MIN(m.kickoff_at) AS kickoff_at
    FROM matches m
    JOIN UNNEST($1::text[], $2::text[], $3::text[])
        AS b(home_team, away_team, championship_label)
        ON m.home_team = b.home_team
        AND m.away_team = b.away_team
        AND m.championship_label = b.championship_label
    WHERE m.kickoff_estimated
    GROUP BY m.home_team, m.away_team, m.championship_label
"#;

const SELECT_COLUMNS: &str = "home_team, away_team, kickoff_at, kickoff_estimated, \
     home_score, away_score, championship_label, status";

pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Scheduled matches, soonest first.
    pub async fn upcoming(&self, limit: i64) -> Result<Vec<MatchRecord>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM matches WHERE status = 'scheduled' \
             ORDER BY kickoff_at ASC LIMIT $1"
        );
        let rows = sqlx::query(&query).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }

    /// Completed matches, latest first.
    pub async fn recent_results(&self, limit: i64) -> Result<Vec<MatchRecord>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM matches WHERE status = 'completed' \
             ORDER BY kickoff_at DESC LIMIT $1"
        );
        let rows = sqlx::query(&query).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

impl MatchStore for PgMatchStore {
    async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<u64> {
        let store_error = |e: sqlx::Error| ScrapeError::Store {
            records: records.len(),
            message: e.to_string(),
        };

        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let undated: Vec<&MatchRecord> = records.iter().filter(|r| r.kickoff_estimated).collect();
        let mut stored = HashMap::new();
        if !undated.is_empty() {
            let rows = sqlx::query(SELECT_ESTIMATED_KICKOFFS)
                .bind(undated.iter().map(|r| r.home_team.clone()).collect::<Vec<_>>())
                .bind(undated.iter().map(|r| r.away_team.clone()).collect::<Vec<_>>())
                .bind(undated.iter().map(|r| r.championship_label.clone()).collect::<Vec<_>>())
                .fetch_all(&mut *tx)
                .await
                .map_err(store_error)?;
            for row in &rows {
                let key = EstimatedKey {
                    home_team: row.try_get("home_team").map_err(store_error)?,
                    away_team: row.try_get("away_team").map_err(store_error)?,
                    championship_label: row.try_get("championship_label").map_err(store_error)?,
                };
                let kickoff_at: NaiveDateTime = row.try_get("kickoff_at").map_err(store_error)?;
                stored.insert(key, kickoff_at);
            }
            debug!("{} undated fixtures already stored", stored.len());
        }
        let records = pin_estimated_kickoffs(records, &stored);

        let mut home_teams = Vec::with_capacity(records.len());
        let mut away_teams = Vec::with_capacity(records.len());
        let mut kickoffs: Vec<NaiveDateTime> = Vec::with_capacity(records.len());
        let mut estimated = Vec::with_capacity(records.len());
        let mut home_scores = Vec::with_capacity(records.len());
        let mut away_scores = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        let mut statuses = Vec::with_capacity(records.len());
        for record in &records {
            home_teams.push(record.home_team.clone());
            away_teams.push(record.away_team.clone());
            kickoffs.push(record.kickoff_at);
            estimated.push(record.kickoff_estimated);
            home_scores.push(record.home_score);
            away_scores.push(record.away_score);
            labels.push(record.championship_label.clone());
            statuses.push(record.status.as_str().to_string());
        }

        let result = sqlx::query(UPSERT_MATCHES)
            .bind(&home_teams)
            .bind(&away_teams)
            .bind(&kickoffs)
            .bind(&estimated)
            .bind(&home_scores)
            .bind(&away_scores)
            .bind(&labels)
            .bind(&statuses)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;

        debug!("Upserted {} rows", result.rows_affected());
        Ok(result.rows_affected())
    }
}

fn record_from_row(row: &PgRow) -> Result<MatchRecord> {
    let status: String = row.try_get("status")?;
    let status = MatchStatus::from_db(&status)
        .ok_or_else(|| ScrapeError::invalid_record(format!("unknown status {status:?}")))?;

    Ok(MatchRecord {
        home_team: row.try_get("home_team")?,
        away_team: row.try_get("away_team")?,
        kickoff_at: row.try_get("kickoff_at")?,
        kickoff_estimated: row.try_get("kickoff_estimated")?,
        home_score: row.try_get("home_score")?,
        away_score: row.try_get("away_score")?,
        championship_label: row.try_get("championship_label")?,
        status,
    })
}
