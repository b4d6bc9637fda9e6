use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::error::{Result, ScrapeError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/volley_club".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimits {
    pub requests_per_second: u32,
    /// Pause between two championship pages of the listing source.
    pub category_pause_ms: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            category_pause_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScrapingConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; VolleyClubTS/1.0)".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// A textual variant of the club name, optionally tied to the championship
/// it identifies when a page does not say which one it is showing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClubAlias {
    pub name: String,
    #[serde(default)]
    pub implied_category: Option<String>,
}

impl ClubAlias {
    pub fn new(name: &str, implied_category: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            implied_category: implied_category.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClubConfig {
    pub aliases: Vec<ClubAlias>,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            aliases: vec![
                ClubAlias::new("VITALFRUTTA VolleyClub TS", None),
                ClubAlias::new("Volley Club", None),
                ClubAlias::new("Volley Club TS", Some("Serie D Femminile")),
                ClubAlias::new("ROSSO Volley Club TS", Some("Serie D Maschile")),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Championship {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListingSourceConfig {
    pub base_url: String,
    pub championships: Vec<Championship>,
}

impl ListingSourceConfig {
    pub fn list_url(&self, championship_id: u32) -> String {
        format!(
            "{}/mobile/risultati.asp?CampionatoId={}",
            self.base_url.trim_end_matches('/'),
            championship_id
        )
    }

    pub fn detail_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if href.starts_with('/') {
            format!("{}{}", base, href)
        } else {
            format!("{}/{}", base, href)
        }
    }
}

impl Default for ListingSourceConfig {
    fn default() -> Self {
        let championship = |id: u32, name: &str| Championship {
            id,
            name: name.to_string(),
        };
        Self {
            base_url: "https://trieste.portalefipav.net".to_string(),
            championships: vec![
                championship(85747, "1a Divisione Maschile"),
                championship(85684, "1a Divisione Femminile"),
                championship(86019, "Under 15 Maschile"),
                championship(85727, "Under 17 Maschile"),
            ],
        }
    }
}

/// Cell positions inside a results table row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabularColumns {
    pub date: usize,
    pub home: usize,
    pub away: usize,
    pub result: usize,
}

impl Default for TabularColumns {
    fn default() -> Self {
        Self {
            date: 2,
            home: 3,
            away: 4,
            result: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TabularSourceConfig {
    pub url: String,
    pub columns: TabularColumns,
}

impl Default for TabularSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://friulivg.portalefipav.net/risultati-classifiche.aspx?PId=7274"
                .to_string(),
            columns: TabularColumns::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourcesConfig {
    pub listing: ListingSourceConfig,
    pub tabular: TabularSourceConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperConfig {
    pub database: DatabaseConfig,
    pub rate_limits: RateLimits,
    pub scraping: ScrapingConfig,
    pub club: ClubConfig,
    pub sources: SourcesConfig,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Loads a JSON config file; fields it leaves out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(rps) = parse_env::<u32>("RATE_LIMIT_RPS") {
            self.rate_limits.requests_per_second = rps;
        }
        if let Some(pause) = parse_env::<u64>("CATEGORY_PAUSE_MS") {
            self.rate_limits.category_pause_ms = pause;
        }
        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            self.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = parse_env::<u64>("SCRAPER_TIMEOUT_SECS") {
            self.scraping.request_timeout_secs = timeout;
        }
        if let Ok(base_url) = env::var("LISTING_BASE_URL") {
            self.sources.listing.base_url = base_url;
        }
        if let Ok(url) = env::var("TABULAR_URL") {
            self.sources.tabular.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.club.aliases.iter().any(|alias| alias.name.trim().is_empty()) {
            return Err(ScrapeError::config("club aliases must not be empty"));
        }
        if self.rate_limits.requests_per_second == 0 {
            return Err(ScrapeError::config("requests_per_second must be at least 1"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ScraperConfig =
            serde_json::from_str(r#"{ "rate_limits": { "requests_per_second": 5 } }"#).unwrap();

        assert_eq!(config.rate_limits.requests_per_second, 5);
        assert_eq!(config.rate_limits.category_pause_ms, 200);
        assert_eq!(config.club.aliases.len(), 4);
        assert_eq!(config.sources.listing.championships.len(), 4);
        assert_eq!(config.sources.tabular.columns, TabularColumns::default());
    }

    #[test]
    fn test_listing_urls() {
        let listing = ListingSourceConfig::default();
        assert_eq!(
            listing.list_url(85747),
            "https://trieste.portalefipav.net/mobile/risultati.asp?CampionatoId=85747"
        );
        assert_eq!(
            listing.detail_url("/mobile/gara.asp?GaraId=1"),
            "https://trieste.portalefipav.net/mobile/gara.asp?GaraId=1"
        );
        assert_eq!(
            listing.detail_url("gara.asp?GaraId=1"),
            "https://trieste.portalefipav.net/gara.asp?GaraId=1"
        );
        assert_eq!(
            listing.detail_url("https://elsewhere.example/gara"),
            "https://elsewhere.example/gara"
        );
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let mut config = ScraperConfig::default();
        config.rate_limits.requests_per_second = 0;
        assert!(config.validate().is_err());
    }
}
