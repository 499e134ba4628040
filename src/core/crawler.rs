use crate::core::spider::{ParseResult, SpiderResponse};
use crate::stats::StatsTracker;
use crate::{HttpRequest, Scraper, ScraperError};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, trace, warn};
use parking_lot::RwLock;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::spawn;
use tokio::task::JoinHandle;
use url::Url;

use crate::{ScraperResult, Spider};

type CrawlTask = JoinHandle<(Url, ScraperResult<ParseResult>)>;

pub struct Crawler {
    scraper: Box<dyn Scraper>,
    visited_urls: Arc<RwLock<HashSet<String>>>,
    stats: Arc<StatsTracker>,
}

impl Crawler {
    pub fn new(scraper: Box<dyn Scraper>) -> Self {
        info!("Initializing crawler");
        let stats = Arc::new(StatsTracker::new());
        let mut scraper = scraper;
        scraper.set_stats(Arc::clone(&stats));

        Self {
            scraper,
            visited_urls: Arc::new(RwLock::new(HashSet::new())),
            stats,
        }
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub async fn run<S: Spider + Send + Sync + 'static>(&self, spider: S) -> ScraperResult<()> {
        let spider = Arc::new(spider);
        let mut pending: VecDeque<HttpRequest> = VecDeque::new();
        let mut futures: FuturesUnordered<CrawlTask> = FuturesUnordered::new();

        info!("Starting spider: {}", spider.name());
        debug!("Max depth: {}", spider.config().max_depth);

        self.enqueue(spider.start_requests(), spider.as_ref(), &mut pending);

        loop {
            while futures.len() < spider.config().max_concurrency {
                match pending.pop_front() {
                    Some(request) => futures.push(self.process_request(request, Arc::clone(&spider))),
                    None => break,
                }
            }
            if !pending.is_empty() {
                debug!(
                    "Reached concurrent request limit {}, {} requests waiting",
                    spider.config().max_concurrency,
                    pending.len()
                );
            }

            let Some(result) = futures.next().await else {
                break;
            };

            match result {
                Ok((_, Ok(parse_result))) => match parse_result {
                    ParseResult::Continue(new_requests) => {
                        debug!("Found {} new URLs to process", new_requests.len());
                        self.enqueue(new_requests, spider.as_ref(), &mut pending);
                    }
                    ParseResult::Scraped(count) => self.stats.record_items_scraped(count),
                    ParseResult::Stop => {
                        info!("Spider requested stop");
                        break;
                    }
                },
                Ok((url, Err(error))) => self.record_failure(&url, error),
                Err(e) => {
                    warn!("Task error: {}", e);
                    self.stats.increment_unhandled_errors();
                }
            }
        }

        for task in futures.iter() {
            task.abort();
        }

        if let Err(e) = spider.close().await {
            warn!("Error while closing spider {}: {}", spider.name(), e);
            self.record_error_kind(&e);
        }

        info!(
            "Spider {} completed. Total URLs processed: {}",
            spider.name(),
            self.visited_urls.read().len()
        );
        self.stats.finish();
        self.stats.print_summary();
        Ok(())
    }

    fn enqueue<S: Spider>(
        &self,
        requests: Vec<HttpRequest>,
        spider: &S,
        pending: &mut VecDeque<HttpRequest>,
    ) {
        let config = spider.config();
        for request in requests {
            if request.depth >= config.max_depth {
                debug!("Skipping URL {} - max depth reached", request.url);
                continue;
            }

            let url_str = request.url.to_string();
            if !config.allow_url_revisit && self.visited_urls.read().contains(&url_str) {
                debug!("Skipping URL {} - already visited", url_str);
                continue;
            }

            info!("Processing URL: {} at depth {}", url_str, request.depth);
            if let Some(meta) = &request.meta {
                trace!("Request metadata: {:?}", meta);
            }

            self.visited_urls.write().insert(url_str);
            pending.push_back(request);
        }
    }

    fn process_request<S: Spider + Send + Sync + 'static>(
        &self,
        request: HttpRequest,
        spider: Arc<S>,
    ) -> CrawlTask {
        let scraper = self.scraper.box_clone();
        let config = spider.config().clone();

        spawn(async move {
            let url = request.url.clone();
            let depth = request.depth;
            let callback = request.callback;

            let result = async {
                let response = scraper.fetch(request, &config).await?;
                if !response.is_success() {
                    return Err(ScraperError::HttpStatus {
                        status: response.status,
                        url: response.url,
                    });
                }
                let spider_response = SpiderResponse { response, callback };
                spider.parse(spider_response, url.clone(), depth).await
            }
            .await;

            (url, result)
        })
    }

    fn record_failure(&self, url: &Url, error: ScraperError) {
        match &error {
            ScraperError::HttpStatus { status, .. } => {
                warn!("Ignoring response {} for {}: HTTP status not handled", status, url);
            }
            _ => warn!("Error processing {}: {}", url, error),
        }
        self.record_error_kind(&error);
    }

    fn record_error_kind(&self, error: &ScraperError) {
        match error {
            ScraperError::ParsingError(_) => self.stats.increment_parsing_errors(),
            ScraperError::StorageError(_) => self.stats.increment_storage_errors(),
            ScraperError::HttpStatus { .. } => self.stats.increment_http_errors(),
            _ => self.stats.increment_unhandled_errors(),
        }
    }
}
