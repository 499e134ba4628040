pub mod core;
pub mod http;
pub mod scrapers;
pub mod spiders;
pub mod stats;
pub mod storage;

pub use self::core::Crawler;
pub use self::core::{ScraperError, ScraperResult, Spider};
pub use http::{HttpRequest, HttpResponse};
pub use scrapers::Scraper;
pub use stats::StatsTracker;
pub use storage::{Storage, StorageBackend};
