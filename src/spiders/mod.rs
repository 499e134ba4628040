pub mod imdb;

pub use imdb::{ImdbSettings, ImdbSpider};

/// Names accepted by `crawl`.
pub const SPIDER_NAMES: &[&str] = &[imdb::SPIDER_NAME];
