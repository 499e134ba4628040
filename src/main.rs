use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use filmocrawl::core::retry::{RetryConfig, DEFAULT_RETRY_TIMES};
use filmocrawl::scrapers::HttpScraper;
use filmocrawl::spiders::imdb::{self, FilmographyMode, EXCLUDED_TITLE};
use filmocrawl::spiders::{ImdbSettings, ImdbSpider, SPIDER_NAMES};
use filmocrawl::storage::{create_storage, StorageType};
use filmocrawl::{Crawler, Spider};

#[derive(Parser, Debug)]
#[command(name = "filmocrawl")]
#[command(about = "Crawls a title's cast and writes every actor's filmography")]
#[command(version)]
struct Cli {
    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a spider and write its items to a feed file
    Crawl(CrawlArgs),
    /// List available spiders
    List,
}

#[derive(clap::Args, Debug)]
struct CrawlArgs {
    /// Spider name
    spider: String,

    /// Feed file; the format follows the extension (.csv, .jsonl, .jl)
    #[arg(short, long)]
    output: PathBuf,

    /// Title page to start from
    #[arg(long, default_value = imdb::DEFAULT_START_URL)]
    start_url: Url,

    /// Filmography entries containing this text are dropped
    #[arg(long, default_value = EXCLUDED_TITLE)]
    excluded_title: String,

    /// How titles are collected from filmography rows
    #[arg(long, value_enum, default_value_t = FilmographyModeArg::Accumulate)]
    filmography_mode: FilmographyModeArg,

    /// Maximum number of requests in flight
    #[arg(short, long, default_value_t = 16)]
    concurrency: usize,

    /// Delay before every request, in milliseconds
    #[arg(long, default_value_t = 0)]
    download_delay_ms: u64,

    /// Retries for server errors, 429 and connection failures
    #[arg(long, default_value_t = DEFAULT_RETRY_TIMES)]
    retry_times: usize,

    /// Requests at or beyond this depth are dropped
    #[arg(long, default_value_t = 3)]
    max_depth: usize,

    /// Override the default User-Agent header
    #[arg(long)]
    user_agent: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FilmographyModeArg {
    /// Collect titles row by row
    Accumulate,
    /// Keep only the whole-page pass, failing pages without rows
    LastRow,
}

impl From<FilmographyModeArg> for FilmographyMode {
    fn from(arg: FilmographyModeArg) -> Self {
        match arg {
            FilmographyModeArg::Accumulate => FilmographyMode::Accumulate,
            FilmographyModeArg::LastRow => FilmographyMode::LastRow,
        }
    }
}

async fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    if args.spider != imdb::SPIDER_NAME {
        bail!(
            "unknown spider '{}' (available: {})",
            args.spider,
            SPIDER_NAMES.join(", ")
        );
    }

    let storage_type = StorageType::from_path(&args.output)
        .with_context(|| format!("cannot write feed to {}", args.output.display()))?;
    let storage = create_storage(storage_type)
        .with_context(|| format!("cannot open {}", args.output.display()))?;

    let settings = ImdbSettings::new(args.start_url)
        .with_excluded_title(&args.excluded_title)
        .with_filmography_mode(args.filmography_mode.into());

    let spider = ImdbSpider::new(settings, storage);
    let spider_config = spider
        .config()
        .clone()
        .with_depth(args.max_depth)
        .with_concurrency(args.concurrency)
        .with_download_delay(Duration::from_millis(args.download_delay_ms))
        .with_retry(RetryConfig::http_defaults(args.retry_times));
    let spider = spider.with_config(spider_config);

    let mut scraper = HttpScraper::new()?;
    if let Some(user_agent) = &args.user_agent {
        scraper = scraper.with_headers(vec![("User-Agent", user_agent.as_str())])?;
    }

    let crawler = Crawler::new(Box::new(scraper));
    crawler.run(spider).await?;

    println!("Feed written to {}", args.output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(cli.log_level.into())
        .filter_module("selectors", LevelFilter::Warn)
        .filter_module("html5ever", LevelFilter::Error)
        .init();

    match cli.command {
        Command::Crawl(args) => crawl(args).await,
        Command::List => {
            for name in SPIDER_NAMES {
                println!("{}", name);
            }
            Ok(())
        }
    }
}
