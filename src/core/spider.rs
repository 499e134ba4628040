use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::retry::RetryConfig;
use crate::{HttpRequest, HttpResponse, ScraperResult};

/// Names the visitor that should handle a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiderCallback {
    /// A start URL.
    Bootstrap,
    ParseCredits,
    ParseActor,
}

#[derive(Debug, Clone)]
pub struct SpiderResponse {
    pub response: HttpResponse,
    pub callback: SpiderCallback,
}

#[derive(Debug)]
pub enum ParseResult {
    /// Schedule these follow-up requests.
    Continue(Vec<HttpRequest>),
    /// This many items were handed to storage; nothing else to schedule.
    Scraped(usize),
    /// Stop the whole crawl.
    Stop,
}

#[derive(Debug, Clone)]
pub struct SpiderConfig {
    pub max_depth: usize,
    pub max_concurrency: usize,
    pub allow_url_revisit: bool,
    pub download_delay: Duration,
    pub headers: Vec<(String, String)>,
    pub retry_config: RetryConfig,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_concurrency: 16,
            allow_url_revisit: false,
            download_delay: Duration::ZERO,
            headers: Vec::new(),
            retry_config: RetryConfig::default(),
        }
    }
}

impl SpiderConfig {
    pub fn with_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_allow_url_revisit(mut self, allow: bool) -> Self {
        self.allow_url_revisit = allow;
        self
    }

    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

#[async_trait]
pub trait Spider {
    fn name(&self) -> String;
    fn start_urls(&self) -> Vec<Url>;
    fn config(&self) -> &SpiderConfig;
    fn set_config(&mut self, config: SpiderConfig);

    fn with_config(mut self, config: SpiderConfig) -> Self
    where
        Self: Sized,
    {
        self.set_config(config);
        self
    }

    fn start_requests(&self) -> Vec<HttpRequest> {
        self.start_urls()
            .into_iter()
            .map(|url| HttpRequest::new(url, SpiderCallback::Bootstrap, 0))
            .collect()
    }

    async fn parse(
        &self,
        response: SpiderResponse,
        url: Url,
        depth: usize,
    ) -> ScraperResult<ParseResult>;

    /// Called once after the request queue drains.
    async fn close(&self) -> ScraperResult<()> {
        Ok(())
    }
}
