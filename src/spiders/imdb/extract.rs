use log::debug;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::SpiderCallback;
use crate::storage::FeedItem;
use crate::{HttpRequest, HttpResponse, ScraperError, ScraperResult};

pub const FULL_CREDITS_PATH: &str = "fullcredits/";
pub const EXCLUDED_TITLE: &str = "Grey's Anatomy";

const CAST_LINK_SELECTOR: &str = "td.primary_photo a";
const ACTOR_NAME_SELECTOR: &str = "span.itemprop";
const FILMOGRAPHY_ROW_SELECTOR: &str = "div.filmo-row";
const BOLD_SELECTOR: &str = "b";
const LINK_SELECTOR: &str = "a";
const BASE_SELECTOR: &str = "base[href]";

/// How the actor visitor collects titles from filmography rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilmographyMode {
    /// Each row contributes the titles in its own sub-tree, in row order.
    #[default]
    Accumulate,
    /// Every row re-reads the whole page, so only the last pass survives.
    /// A page with no rows is an error.
    LastRow,
}

/// One actor and the titles they are credited in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    #[serde(rename = "actor")]
    pub actor_name: Option<String>,
    #[serde(rename = "movie_or_tv_name")]
    pub filmography: Vec<String>,
}

impl FeedItem for ActorRecord {
    fn csv_header() -> &'static [&'static str] {
        &["actor", "movie_or_tv_name"]
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.actor_name.clone().unwrap_or_default(),
            self.filmography.join(","),
        ]
    }
}

fn selector(css: &str) -> ScraperResult<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::ParsingError(format!("bad selector {css}: {e}")))
}

/// The URL relative links resolve against: `<base href>` if the page has one.
fn base_url(document: &Html, page_url: &Url) -> ScraperResult<Url> {
    let base = document
        .select(&selector(BASE_SELECTOR)?)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href).ok());
    Ok(base.unwrap_or_else(|| page_url.clone()))
}

/// Direct text children only, like a `::text` pseudo-element.
fn own_text(element: ElementRef<'_>) -> impl Iterator<Item = String> + '_ {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| text.to_string()))
}

/// Link text of every `a` inside every `b` under `scope`, minus excluded titles.
fn bold_link_titles(
    scope: ElementRef<'_>,
    bold: &Selector,
    link: &Selector,
    excluded_title: &str,
) -> Vec<String> {
    scope
        .select(bold)
        .flat_map(|b| b.select(link).collect::<Vec<_>>())
        .flat_map(|a| own_text(a).collect::<Vec<_>>())
        .filter(|title| !title.contains(excluded_title))
        .collect()
}

/// The start page links to its cast listing at a fixed relative path.
pub fn visit_title_page(response: &HttpResponse, depth: usize) -> ScraperResult<Vec<HttpRequest>> {
    let document = Html::parse_document(&response.body);
    let credits_url = base_url(&document, &response.url)?.join(FULL_CREDITS_PATH)?;
    debug!("Credits page for {} is {}", response.url, credits_url);

    Ok(vec![HttpRequest::new(
        credits_url,
        SpiderCallback::ParseCredits,
        depth + 1,
    )])
}

/// One actor request per primary-photo link, in page order, duplicates kept.
pub fn visit_credits_page(
    response: &HttpResponse,
    depth: usize,
) -> ScraperResult<Vec<HttpRequest>> {
    let document = Html::parse_document(&response.body);
    let base = base_url(&document, &response.url)?;

    let mut requests = Vec::new();
    for anchor in document.select(&selector(CAST_LINK_SELECTOR)?) {
        let Some(href) = anchor.value().attr("href") else {
            debug!("Cast link without href on {}", response.url);
            continue;
        };
        match base.join(href) {
            Ok(actor_url) => requests.push(
                HttpRequest::new(actor_url, SpiderCallback::ParseActor, depth + 1)
                    .with_meta(serde_json::json!({ "credits_page": response.url.as_str() }))?,
            ),
            Err(e) => debug!("Skipping cast link {:?} on {}: {}", href, response.url, e),
        }
    }

    debug!("Found {} cast links on {}", requests.len(), response.url);
    Ok(requests)
}

pub fn visit_actor_page(
    response: &HttpResponse,
    excluded_title: &str,
    mode: FilmographyMode,
) -> ScraperResult<ActorRecord> {
    let document = Html::parse_document(&response.body);

    let actor_name = document
        .select(&selector(ACTOR_NAME_SELECTOR)?)
        .find_map(|element| own_text(element).next());

    let bold = selector(BOLD_SELECTOR)?;
    let link = selector(LINK_SELECTOR)?;
    let titles_in = |scope: ElementRef<'_>| bold_link_titles(scope, &bold, &link, excluded_title);

    let rows: Vec<ElementRef<'_>> = document
        .select(&selector(FILMOGRAPHY_ROW_SELECTOR)?)
        .collect();

    let filmography: Vec<String> = match mode {
        FilmographyMode::Accumulate => rows.iter().flat_map(|row| titles_in(*row)).collect(),
        FilmographyMode::LastRow => {
            if rows.is_empty() {
                return Err(ScraperError::ParsingError(format!(
                    "no filmography rows on {}",
                    response.url
                )));
            }
            titles_in(document.root_element())
        }
    };

    debug!(
        "Actor {:?} on {}: {} titles from {} rows",
        actor_name,
        response.url,
        filmography.len(),
        rows.len()
    );

    Ok(ActorRecord {
        actor_name,
        filmography,
    })
}
