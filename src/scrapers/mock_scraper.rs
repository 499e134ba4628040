use crate::core::SpiderConfig;
use crate::http::{HttpRequest, HttpResponse, ResponseType};
use crate::{ScraperResult, StatsTracker};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use url::Url;

use super::Scraper;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<std::time::Duration>,
}

impl MockResponse {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: None,
        }
    }
}

/// Serves scripted responses per URL. Each URL walks its script in order and
/// repeats the last entry; unknown URLs get a 404.
#[derive(Clone)]
pub struct MockScraper {
    routes: Arc<HashMap<String, Vec<MockResponse>>>,
    hits: Arc<RwLock<HashMap<String, AtomicUsize>>>,
    requested: Arc<RwLock<Vec<Url>>>,
    stats: Arc<StatsTracker>,
}

impl MockScraper {
    pub fn new(routes: Vec<(&str, Vec<MockResponse>)>) -> Self {
        Self {
            routes: Arc::new(
                routes
                    .into_iter()
                    .map(|(url, responses)| (url.to_string(), responses))
                    .collect(),
            ),
            hits: Arc::new(RwLock::new(HashMap::new())),
            requested: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(StatsTracker::new()),
        }
    }

    /// Every URL fetched so far, retries included, in fetch order.
    pub fn requested_urls(&self) -> Vec<Url> {
        self.requested.read().clone()
    }

    fn next_index(&self, url: &str) -> usize {
        if let Some(counter) = self.hits.read().get(url) {
            return counter.fetch_add(1, Ordering::SeqCst);
        }
        self.hits
            .write()
            .entry(url.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        _config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        let key = request.url.to_string();
        self.requested.write().push(request.url.clone());

        let response = match self.routes.get(&key).filter(|script| !script.is_empty()) {
            Some(script) => {
                let index = self.next_index(&key).min(script.len() - 1);
                script[index].clone()
            }
            None => MockResponse::status(404),
        };

        if let Some(delay) = response.delay {
            sleep(delay).await;
        }

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());

        Ok(HttpResponse {
            url: request.url.clone(),
            status: response.status,
            headers,
            body: response.body,
            timestamp: Utc::now(),
            retry_count: 0,
            retry_history: HashMap::new(),
            response_type: ResponseType::Html,
            from_request: Box::new(request),
        })
    }

    fn box_clone(&self) -> Box<dyn Scraper> {
        Box::new(self.clone())
    }

    fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    fn set_stats(&mut self, stats: Arc<StatsTracker>) {
        self.stats = stats;
    }
}
