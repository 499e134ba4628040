use crate::core::retry::RetryState;
use crate::core::SpiderConfig;
use crate::{HttpRequest, HttpResponse, ScraperResult, StatsTracker};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::sleep;

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse>;
    fn box_clone(&self) -> Box<dyn Scraper>;
    fn stats(&self) -> &StatsTracker;
    fn set_stats(&mut self, stats: Arc<StatsTracker>);

    /// Fetches `request`, sleeping the politeness delay before every attempt
    /// and retrying whatever `config.retry_config` says is retryable.
    async fn fetch(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        let start_time = Utc::now();
        let retry_config = &config.retry_config;
        let url = request.url.clone();
        let mut state = RetryState::new();

        loop {
            if !config.download_delay.is_zero() {
                sleep(config.download_delay).await;
            }

            info!("Fetching URL: {}", url);
            let response = match self.fetch_single(request.clone(), config).await {
                Ok(response) => response,
                Err(e) => {
                    if let Some((category, delay)) = retry_config.should_retry_transport(&mut state)
                    {
                        self.stats().record_retry(format!("{:?}", category));
                        warn!(
                            "Retrying {} after transport error: {} (category={:?}, delay={:?})",
                            url, e, category, delay
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return Err(e);
                }
            };
            debug!(
                "Received response: status={}, body_length={}",
                response.status,
                response.body.len()
            );

            if let Some((category, delay)) =
                retry_config.should_retry_request(&mut state, response.status, &response.body)
            {
                self.stats().record_retry(format!("{:?}", category));
                let attempt = state.counts.get(&category).copied().unwrap_or(0);

                warn!(
                    "Retry triggered for URL: {} (category={:?}, attempt={}/{}, delay={:?})",
                    url,
                    category,
                    attempt,
                    retry_config
                        .categories
                        .get(&category)
                        .map(|c| c.max_retries)
                        .unwrap_or(0),
                    delay
                );

                sleep(delay).await;
                continue;
            }

            info!(
                "Request completed for URL: {} (total_retries={}, status={})",
                url, state.total_retries, response.status
            );
            debug!("Retry history for {}: {:?}", url, state.counts);

            let duration = Utc::now().signed_duration_since(start_time);
            self.stats()
                .record_request(response.status, response.body.len(), duration);

            return Ok(HttpResponse {
                retry_count: state.total_retries,
                retry_history: state.counts,
                ..response
            });
        }
    }
}
