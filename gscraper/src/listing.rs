//! Listing page parsing.
//!
//! Result blocks live under the `#rso` container. Web results are `div.rc`
//! blocks holding a `div.r` link and a `div.s` snippet; news results (and
//! every result of an image search) are `div.g` blocks. Image searches
//! still lay their blocks out like web results.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::types::{Candidate, SearchKind};

/// How to read result blocks from a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Web,
    News,
    Image,
}

impl ListingMode {
    /// Image mode wins over the search kind.
    pub fn new(kind: SearchKind, image_search: bool) -> Self {
        match (kind, image_search) {
            (_, true) => Self::Image,
            (SearchKind::News, false) => Self::News,
            (SearchKind::All, false) => Self::Web,
        }
    }

    fn block_selector(self) -> &'static str {
        match self {
            Self::Web => "#rso div.rc",
            Self::News | Self::Image => "#rso div.g",
        }
    }
}

struct Selectors {
    block: Selector,
    anchor: Selector,
    img: Selector,
    span: Selector,
    news_snippet: Selector,
    result: Selector,
    heading: Selector,
    snippet: Selector,
    snippet_text: Selector,
}

impl Selectors {
    fn new(mode: ListingMode) -> Result<Self, ScrapeError> {
        Ok(Self {
            block: selector(mode.block_selector())?,
            anchor: selector("a")?,
            img: selector("img")?,
            span: selector("span")?,
            news_snippet: selector("div.st")?,
            result: selector("div.r")?,
            heading: selector("h3")?,
            snippet: selector("div.s")?,
            snippet_text: selector("span.st")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Parse up to `limit` candidates from a listing page, in listing order.
///
/// `base_url` is the listing endpoint; relative result links are resolved
/// against it and `/url?q=` redirect wrappers are unwrapped. Blocks missing
/// a usable link are skipped.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if a selector or `base_url` is invalid.
pub fn parse_listing(
    html: &str,
    mode: ListingMode,
    limit: usize,
    base_url: &str,
) -> Result<Vec<Candidate>, ScrapeError> {
    let base = Url::parse(base_url)
        .map_err(|e| ScrapeError::Parse(format!("invalid listing URL {base_url}: {e}")))?;
    let sels = Selectors::new(mode)?;
    let document = Html::parse_document(html);

    let mut candidates = Vec::new();
    for block in document.select(&sels.block) {
        if candidates.len() >= limit {
            break;
        }
        let parsed = match mode {
            ListingMode::News => parse_news_block(block, &sels),
            ListingMode::Web | ListingMode::Image => parse_web_block(block, &sels),
        };
        let Some(mut candidate) = parsed else {
            continue;
        };
        let Some(url) = resolve_result_url(&candidate.url, &base) else {
            continue;
        };
        candidate.url = url;
        candidates.push(candidate);
    }

    tracing::debug!(count = candidates.len(), ?mode, "listing parsed");
    Ok(candidates)
}

fn parse_news_block(block: ElementRef<'_>, sels: &Selectors) -> Option<Candidate> {
    let anchor = block
        .select(&sels.anchor)
        .find(|a| a.select(&sels.img).next().is_none())?;
    let href = anchor.value().attr("href")?;

    Some(Candidate {
        url: href.to_owned(),
        title: element_text(anchor),
        description: block
            .select(&sels.news_snippet)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        author: block.select(&sels.span).next().map(element_text),
    })
}

fn parse_web_block(block: ElementRef<'_>, sels: &Selectors) -> Option<Candidate> {
    let result = block.select(&sels.result).next()?;
    let anchor = result.select(&sels.anchor).next()?;
    let href = anchor.value().attr("href")?;

    let title = anchor
        .select(&sels.heading)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let description = block
        .select(&sels.snippet)
        .next()
        .map(|snippet| {
            snippet
                .select(&sels.snippet_text)
                .next()
                .map_or_else(|| element_text(snippet), element_text)
        })
        .unwrap_or_default();

    Some(Candidate {
        url: href.to_owned(),
        title,
        description,
        author: None,
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Resolve a result link to an absolute page URL.
///
/// Links like `/url?q=https://example.com/&sa=U` point at the backend's
/// redirector; the target is taken from the `q` (or `url`) parameter.
fn resolve_result_url(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let link = base.join(href).ok()?;

    if link.path() == "/url" && link.host_str() == base.host_str() {
        return link
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .and_then(|(_, target)| Url::parse(&target).ok())
            .map(String::from);
    }
    Some(link.into())
}
