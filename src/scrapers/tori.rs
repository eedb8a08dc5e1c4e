use crate::error::FetchError;
use crate::models::Listing;
use crate::scrapers::traits::Fetcher;
use crate::scrapers::types::SearchParams;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://muusikoiden.net";

/// Cell holding the ad title
const TITLE_CELL: usize = 0;
/// Cell whose `span[title]` carries the added/edited timestamps
const DATES_CELL: usize = 2;
/// Cell holding the description (`font`) and the price line (`p`)
const BODY_CELL: usize = 7;

/// Scraper for the muusikoiden.net tori marketplace
pub struct ToriScraper {
    client: Client,
    base_url: String,
}

impl ToriScraper {
    /// Create a scraper against the public site
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a scraper against another host, e.g. a local mirror
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the newest-first "for sale" search request, matching titles only
    pub fn search_request(&self, params: &SearchParams) -> reqwest::Result<reqwest::Request> {
        self.client
            .get(format!("{}/tori/haku.php", self.base_url))
            .query(&[
                ("keyword", params.keyword.as_str()),
                ("title_only", "1"),
                ("category", params.category.as_str()),
                ("type", "sell"),
                ("sort", "new"),
            ])
            .build()
    }
}

#[async_trait]
impl Fetcher for ToriScraper {
    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Listing>, FetchError> {
        info!(keyword = %params.keyword, category = %params.category, "Searching tori");

        let request = self.search_request(params)?;
        debug!("Fetching URL: {}", request.url());

        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            warn!("Tori returned status: {}", response.status());
            return Err(FetchError::Status(response.status()));
        }

        let html = response.text().await?;
        debug!("Downloaded {} bytes of HTML", html.len());

        let listings = parse_listings(&html, &self.base_url)?;
        info!("Found {} listings", listings.len());
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "muusikoiden.net"
    }
}

/// Extract listings from a tori search result page.
///
/// Every ad follows an `hr.hort_sep` separator as `<a name=ID>` and then a
/// table. Separators followed by anything else are page furniture.
pub fn parse_listings(html: &str, base_url: &str) -> Result<Vec<Listing>, FetchError> {
    let document = Html::parse_document(html);
    let separators = selector("hr.hort_sep")?;
    let cells = selector("td")?;
    let dated = selector("span[title]")?;
    let font = selector("font")?;
    let paragraph = selector("p")?;
    let timestamp = pattern(r"\d{1,2}\.\d{1,2}\.\d{4} \d{1,2}:\d{2}")?;
    let amount = pattern(r"\d+(?:[ \u{a0}]\d{3})*")?;

    let mut listings = Vec::new();
    let mut seen = HashSet::new();

    for separator in document.select(&separators) {
        let Some(anchor) = next_element(separator).filter(|e| e.value().name() == "a") else {
            continue;
        };
        let Some(id) = anchor.value().attr("name") else {
            continue;
        };

        let table = next_element(anchor)
            .ok_or_else(|| FetchError::Parse(format!("ad {id}: table missing")))?;
        let tds: Vec<ElementRef> = table.select(&cells).collect();
        if tds.len() <= BODY_CELL {
            return Err(FetchError::Parse(format!(
                "ad {id}: expected at least {} cells, found {}",
                BODY_CELL + 1,
                tds.len()
            )));
        }

        let raw_title = text_of(tds[TITLE_CELL]);
        let title = raw_title
            .strip_prefix("Myydään:")
            .unwrap_or(&raw_title)
            .trim()
            .to_string();

        let dates = tds[DATES_CELL]
            .select(&dated)
            .next()
            .and_then(|span| span.value().attr("title"))
            .ok_or_else(|| FetchError::Parse(format!("ad {id}: timestamp missing")))?;
        let mut stamps = timestamp.find_iter(dates).map(|m| m.as_str().to_string());
        let created = stamps
            .next()
            .ok_or_else(|| FetchError::Parse(format!("ad {id}: no creation time in {dates:?}")))?;
        let updated = stamps.next();

        let body = tds[BODY_CELL];
        let description = body.select(&font).next().map(text_of).unwrap_or_default();
        let price: Option<u64> = body.select(&paragraph).next().and_then(|p| {
            let line = text_of(p);
            let figure = line.split_once(':').map_or(line.as_str(), |(_, rest)| rest);
            amount.find(figure).and_then(|m| {
                m.as_str()
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .ok()
            })
        });

        let url = format!("{base_url}/tori/ilmoitus/{id}");
        if !seen.insert(url.clone()) {
            debug!(%url, "Skipping repeated ad");
            continue;
        }

        listings.push(Listing {
            url,
            title,
            description,
            price,
            created,
            updated,
        });
    }

    Ok(listings)
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("bad selector {css}: {e}")))
}

fn pattern(re: &str) -> Result<Regex, FetchError> {
    Regex::new(re).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Next sibling element, skipping whitespace and comments only
fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .next_siblings()
        .find(|node| match node.value() {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Comment(_) => false,
            _ => true,
        })
        .and_then(ElementRef::wrap)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
