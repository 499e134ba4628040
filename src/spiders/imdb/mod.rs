mod extract;

pub use extract::{
    visit_actor_page, visit_credits_page, visit_title_page, ActorRecord, FilmographyMode,
    EXCLUDED_TITLE, FULL_CREDITS_PATH,
};

use crate::core::retry::{RetryConfig, DEFAULT_RETRY_TIMES};
use crate::core::spider::{ParseResult, SpiderCallback, SpiderConfig, SpiderResponse};
use crate::storage::{Storage, StorageBackend};
use crate::{ScraperResult, Spider};
use async_trait::async_trait;
use log::{debug, info};
use url::Url;

pub const SPIDER_NAME: &str = "imdb_spider";
pub const DEFAULT_START_URL: &str = "https://www.imdb.com/title/tt0413573/";

#[derive(Debug, Clone)]
pub struct ImdbSettings {
    pub start_url: Url,
    pub excluded_title: String,
    pub filmography_mode: FilmographyMode,
}

impl ImdbSettings {
    pub fn new(start_url: Url) -> Self {
        Self {
            start_url,
            excluded_title: EXCLUDED_TITLE.to_string(),
            filmography_mode: FilmographyMode::default(),
        }
    }

    pub fn with_excluded_title(mut self, title: &str) -> Self {
        self.excluded_title = title.to_string();
        self
    }

    pub fn with_filmography_mode(mut self, mode: FilmographyMode) -> Self {
        self.filmography_mode = mode;
        self
    }
}

/// Title page, then its full credits, then one record per credited actor.
pub struct ImdbSpider {
    config: SpiderConfig,
    settings: ImdbSettings,
    storage: Storage,
}

impl ImdbSpider {
    pub fn new(settings: ImdbSettings, storage: Storage) -> Self {
        Self {
            // An actor linked twice is visited twice.
            config: SpiderConfig::default()
                .with_depth(3)
                .with_allow_url_revisit(true)
                .with_retry(RetryConfig::http_defaults(DEFAULT_RETRY_TIMES)),
            settings,
            storage,
        }
    }

    async fn parse_actor(&self, response: &SpiderResponse) -> ScraperResult<ParseResult> {
        let record = visit_actor_page(
            &response.response,
            &self.settings.excluded_title,
            self.settings.filmography_mode,
        )?;
        self.storage.store(&record).await?;
        debug!(
            "Stored {} titles for {:?}",
            record.filmography.len(),
            record.actor_name
        );
        Ok(ParseResult::Scraped(1))
    }
}

#[async_trait]
impl Spider for ImdbSpider {
    fn name(&self) -> String {
        SPIDER_NAME.to_string()
    }

    fn start_urls(&self) -> Vec<Url> {
        vec![self.settings.start_url.clone()]
    }

    fn config(&self) -> &SpiderConfig {
        &self.config
    }

    fn set_config(&mut self, config: SpiderConfig) {
        self.config = config;
    }

    async fn parse(
        &self,
        spider_response: SpiderResponse,
        url: Url,
        depth: usize,
    ) -> ScraperResult<ParseResult> {
        debug!("Parsing {} as {:?}", url, spider_response.callback);
        match spider_response.callback {
            SpiderCallback::Bootstrap => Ok(ParseResult::Continue(visit_title_page(
                &spider_response.response,
                depth,
            )?)),
            SpiderCallback::ParseCredits => Ok(ParseResult::Continue(visit_credits_page(
                &spider_response.response,
                depth,
            )?)),
            SpiderCallback::ParseActor => self.parse_actor(&spider_response).await,
        }
    }

    async fn close(&self) -> ScraperResult<()> {
        self.storage.flush().await?;
        info!("Flushed feed for spider {}", SPIDER_NAME);
        Ok(())
    }
}
