use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, ClientBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::Scraper;
use crate::core::SpiderConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::{ScraperError, ScraperResult, StatsTracker};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Error)]
pub enum HttpScraperError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] header::InvalidHeaderName),
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}

impl From<HttpScraperError> for ScraperError {
    fn from(err: HttpScraperError) -> Self {
        match err {
            HttpScraperError::HttpError(e) => ScraperError::HttpError(e),
            other => ScraperError::ParsingError(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct HttpScraper {
    client: Client,
    stats: Arc<StatsTracker>,
}

impl HttpScraper {
    pub fn new() -> Result<Self, HttpScraperError> {
        let client = ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            stats: Arc::new(StatsTracker::new()),
        })
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Result<Self, HttpScraperError> {
        let mut header_map = header::HeaderMap::new();
        header_map.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(DEFAULT_USER_AGENT),
        );

        for (key, value) in headers {
            let name = header::HeaderName::from_bytes(key.as_bytes())?;
            let value = header::HeaderValue::from_str(value)?;
            header_map.insert(name, value);
        }

        self.client = ClientBuilder::new()
            .default_headers(header_map)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(self)
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn fetch_single(
        &self,
        request: HttpRequest,
        config: &SpiderConfig,
    ) -> ScraperResult<HttpResponse> {
        let mut req = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (key, value) in &config.headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        let timestamp = Utc::now();
        let response = req.send().await.map_err(HttpScraperError::from)?;

        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = Self::extract_headers(&response);
        // Lossy decoding; undecodable bytes never abort a page.
        let body = response.text().await.map_err(HttpScraperError::from)?;
        let response_type = HttpResponse::detect_type(&headers, &body);

        Ok(HttpResponse {
            url,
            status,
            headers,
            body,
            timestamp,
            retry_count: 0,
            retry_history: HashMap::new(),
            response_type,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::{BackoffPolicy, CategoryConfig, RetryCategory, RetryCondition, RetryConfig};
    use crate::core::SpiderCallback;
    use crate::http::ResponseType;
    use reqwest::Method;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> Result<(HttpScraper, MockServer), HttpScraperError> {
        let server = MockServer::start().await;
        let scraper = HttpScraper::new()?;
        Ok((scraper, server))
    }

    fn url_for(server: &MockServer, route: &str) -> Url {
        Url::parse(&server.uri()).unwrap().join(route).unwrap()
    }

    #[tokio::test]
    async fn test_get_html_page() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/title/tt000/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>Grey's</body></html>")
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let url = url_for(&mock_server, "/title/tt000/");
        let response = scraper
            .fetch(
                HttpRequest::new(url.clone(), SpiderCallback::Bootstrap, 0),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.url, url);
        assert_eq!(response.body, "<html><body>Grey's</body></html>");
        assert_eq!(response.response_type, ResponseType::Html);
        assert_eq!(response.from_request.callback, SpiderCallback::Bootstrap);
    }

    #[tokio::test]
    async fn test_head_request() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("HEAD"))
            .and(path("/name/nm1/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let request = HttpRequest::new(
            url_for(&mock_server, "/name/nm1/"),
            SpiderCallback::ParseActor,
            2,
        )
        .with_method(Method::HEAD);
        let response = scraper
            .fetch(request, &SpiderConfig::default())
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_raised() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let response = scraper
            .fetch(
                HttpRequest::new(url_for(&mock_server, "/error"), SpiderCallback::Bootstrap, 0),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert_eq!(response.body, "Not Found");
        assert_eq!(response.response_type, ResponseType::Text);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let mut retry_config = RetryConfig::default();
        retry_config.categories.insert(
            RetryCategory::ServerError,
            CategoryConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                conditions: vec![RetryCondition::StatusCode(503)],
                backoff_policy: BackoffPolicy::Constant,
            },
        );

        let response = scraper
            .fetch(
                HttpRequest::new(url_for(&mock_server, "/flaky"), SpiderCallback::Bootstrap, 0),
                &SpiderConfig::default().with_retry(retry_config),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.retry_count, 1);
        assert_eq!(
            response.retry_history.get(&RetryCategory::ServerError),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_custom_headers() {
        let (scraper, mock_server) = setup().await.unwrap();
        let custom_ua = "CustomBot/1.0";
        let scraper = scraper
            .with_headers(vec![("user-agent", custom_ua)])
            .unwrap();

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", custom_ua))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let response = scraper
            .fetch(
                HttpRequest::new(url, SpiderCallback::Bootstrap, 0),
                &SpiderConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_config_headers_are_sent() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("accept-language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_string("english"))
            .mount(&mock_server)
            .await;

        let config = SpiderConfig::default().with_headers(vec![("Accept-Language", "en")]);
        let response = scraper
            .fetch(
                HttpRequest::new(
                    Url::parse(&mock_server.uri()).unwrap(),
                    SpiderCallback::Bootstrap,
                    0,
                ),
                &config,
            )
            .await
            .unwrap();

        assert_eq!(response.body, "english");
    }

    #[tokio::test]
    async fn test_request_headers() {
        let (scraper, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("referer", "https://example.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("referred"))
            .mount(&mock_server)
            .await;

        let request = HttpRequest::new(
            Url::parse(&mock_server.uri()).unwrap(),
            SpiderCallback::Bootstrap,
            0,
        )
        .with_header("Referer", "https://example.com/");
        let response = scraper
            .fetch(request, &SpiderConfig::default())
            .await
            .unwrap();

        assert_eq!(response.body, "referred");
    }

    #[tokio::test]
    async fn test_invalid_headers() {
        let scraper = HttpScraper::new().unwrap();
        let result = scraper.with_headers(vec![("invalid\0header", "value")]);
        assert!(result.is_err());
    }
}
