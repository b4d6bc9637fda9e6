use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use tracing::debug;

use crate::{config::ScraperConfig, error::Result};

/// Source of raw HTML. The pipeline only ever talks to the network through
/// this, so adapters can be driven from fixture pages.
#[allow(async_fn_in_trait)]
pub trait HtmlFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

impl<F: HtmlFetcher> HtmlFetcher for &F {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        (**self).fetch_html(url).await
    }
}

/// Plain GETs with a shared rate limit, so successive requests to the
/// federation servers are spaced out rather than fired back to back.
pub struct WebHtmlFetcher {
    client: reqwest::Client,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl WebHtmlFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(Duration::from_secs(config.scraping.request_timeout_secs))
            .build()?;

        let rps = NonZeroU32::new(config.rate_limits.requests_per_second).unwrap_or(nonzero!(1u32));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            rate_limiter,
        })
    }
}

impl HtmlFetcher for WebHtmlFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.rate_limits.requests_per_second = 50;
        config
    }

    #[tokio::test]
    async fn test_fetches_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mobile/risultati.asp")
            .with_status(200)
            .with_body("<html><body>ok</body></html>")
            .create_async()
            .await;

        let fetcher = WebHtmlFetcher::new(&config()).unwrap();
        let body = fetcher
            .fetch_html(&format!("{}/mobile/risultati.asp", server.url()))
            .await
            .unwrap();

        assert!(body.contains("ok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_ok_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = WebHtmlFetcher::new(&config()).unwrap();
        let result = fetcher.fetch_html(&format!("{}/missing", server.url())).await;

        assert!(result.is_err());
    }
}
