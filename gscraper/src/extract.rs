//! Page content extraction.
//!
//! Works in two passes over one parsed document. The first pass decides
//! which elements are stripped: anything whose tag is excluded, whose inline
//! style hides it, or whose class is hidden by a `<style>` rule. The second
//! pass walks the document skipping stripped subtrees while it collects
//! images and scans content elements for body text.
//!
//! Body text uses a word-count boundary: an element counts as content when
//! it has at least `whitespace_threshold` words. With `break_threshold` set,
//! the first element always opens the content run and the first short
//! element after that ends the scan for the whole page.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::http;
use crate::types::{Candidate, ImageRef, ResultRecord, SearchSpec, TagSet};

/// The extraction settings taken from a [`SearchSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRules {
    pub content_tags: TagSet,
    pub exclude_tags: TagSet,
    pub whitespace_threshold: usize,
    pub break_threshold: bool,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::from(&SearchSpec::new(""))
    }
}

impl From<&SearchSpec> for ExtractionRules {
    fn from(spec: &SearchSpec) -> Self {
        Self {
            content_tags: spec.content_tags.clone(),
            exclude_tags: spec.exclude_tags.clone(),
            whitespace_threshold: spec.whitespace_threshold,
            break_threshold: spec.break_threshold,
        }
    }
}

/// What one page yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    /// Text of the `<title>` element, if the page has one.
    pub title: Option<String>,
    pub images: Vec<ImageRef>,
    /// Normalised body text; empty when nothing qualified.
    pub content: String,
}

impl PageExtract {
    /// Fold this extract into `record`. Returns `false` if the record has no
    /// content and must be dropped.
    pub fn apply_to(self, record: &mut ResultRecord) -> bool {
        if let Some(title) = self.title {
            record.title = title;
        }
        record.images.extend(self.images);
        let has_content = !self.content.is_empty();
        record.content = Some(self.content);
        has_content
    }
}

/// Decides which elements are removed before scanning.
struct Visibility<'r> {
    exclude_tags: &'r TagSet,
    hidden_classes: HashSet<String>,
}

impl<'r> Visibility<'r> {
    fn new(document: &Html, exclude_tags: &'r TagSet) -> Self {
        Self {
            exclude_tags,
            hidden_classes: hidden_classes(document),
        }
    }

    /// Whether this element itself is removed, ignoring its ancestors.
    fn hides(&self, element: ElementRef<'_>) -> bool {
        let el = element.value();
        if self.exclude_tags.contains(el.name()) {
            return true;
        }
        if el.attr("style").is_some_and(|style| compact_css(style).contains("display:none")) {
            return true;
        }
        el.classes()
            .any(|class| self.hidden_classes.contains(&class.to_ascii_lowercase()))
    }

    /// Whether this element or any ancestor is removed.
    fn is_stripped(&self, element: ElementRef<'_>) -> bool {
        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .any(|el| self.hides(el))
    }

    /// Text under `element`, skipping removed descendants.
    fn visible_text(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(text);
            } else if let Some(child_el) = ElementRef::wrap(child) {
                if !self.hides(child_el) {
                    self.visible_text(child_el, out);
                }
            }
        }
    }
}

/// Lowercase CSS with all whitespace removed, so `Display : None` matches.
fn compact_css(css: &str) -> String {
    css.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Class names hidden by `.name{display:none}` rules in `<style>` blocks.
fn hidden_classes(document: &Html) -> HashSet<String> {
    let mut classes = HashSet::new();
    let Ok(style_sel) = Selector::parse("style") else {
        return classes;
    };
    let Ok(rule) = Regex::new(r"\.([_a-z0-9-]+)\{[^}]*display:none[^}]*\}") else {
        return classes;
    };
    for style in document.select(&style_sel) {
        let css = compact_css(&style.text().collect::<String>());
        for caps in rule.captures_iter(&css) {
            classes.insert(caps[1].to_owned());
        }
    }
    classes
}

/// Extract title, images and body text from a page.
pub fn extract_page(html: &str, rules: &ExtractionRules) -> PageExtract {
    let document = Html::parse_document(html);
    let visibility = Visibility::new(&document, &rules.exclude_tags);

    PageExtract {
        title: extract_title(&document),
        images: collect_images(&document, &visibility),
        content: normalise_content(&scan_content(&document, &visibility, rules)),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document.select(&selector).next().map(|title| {
        title
            .text()
            .collect::<String>()
            .replace("\r\n", "\n")
            .replace('\n', " ")
            .trim()
            .to_owned()
    })
}

fn collect_images(document: &Html, visibility: &Visibility<'_>) -> Vec<ImageRef> {
    let Ok(img_sel) = Selector::parse("img") else {
        return Vec::new();
    };
    document
        .select(&img_sel)
        .filter(|img| !visibility.is_stripped(*img))
        .filter_map(|img| {
            let el = img.value();
            let src = el.attr("src").filter(|src| !src.is_empty())?;
            Some(ImageRef {
                caption: el.attr("alt").map(str::to_owned),
                url: src.to_owned(),
            })
        })
        .collect()
}

/// Apply the word-count boundary to content elements in document order.
fn scan_content(document: &Html, visibility: &Visibility<'_>, rules: &ExtractionRules) -> String {
    let mut content = String::new();
    let mut content_started = false;

    let candidates = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| rules.content_tags.contains(el.value().name()))
        .filter(|el| !visibility.is_stripped(*el));

    for element in candidates {
        let mut text = String::new();
        visibility.visible_text(element, &mut text);
        let words = text.split_whitespace().count();

        if words >= rules.whitespace_threshold || (rules.break_threshold && !content_started) {
            content.push_str(&text);
            content.push(' ');
            content_started = true;
        } else if content_started && rules.break_threshold {
            break;
        }
    }
    content
}

/// CRLF to LF, any whitespace run spanning two or more newlines collapsed
/// to one blank line, then trimmed.
fn normalise_content(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            run.push(ch);
        } else {
            push_whitespace_run(&mut out, &run);
            run.clear();
            out.push(ch);
        }
    }
    push_whitespace_run(&mut out, &run);

    out.trim().to_owned()
}

fn push_whitespace_run(out: &mut String, run: &str) {
    match (run.find('\n'), run.rfind('\n')) {
        (Some(first), Some(last)) if first != last => {
            out.push_str(&run[..first]);
            out.push_str("\n\n");
            out.push_str(&run[last + 1..]);
        }
        _ => out.push_str(run),
    }
}

/// Fetch the candidate's page and build its record.
///
/// Returns `None` (after logging) when the page cannot be fetched or yields
/// no content.
pub async fn extract_record(
    client: &reqwest::Client,
    candidate: Candidate,
    rules: &ExtractionRules,
) -> Option<ResultRecord> {
    let html = match http::get_text(client, &candidate.url).await {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!(url = %candidate.url, error = %err, "page fetch failed, skipping");
            return None;
        }
    };
    tracing::trace!(url = %candidate.url, bytes = html.len(), "page received");

    let mut record = ResultRecord::from(candidate);
    if extract_page(&html, rules).apply_to(&mut record) {
        Some(record)
    } else {
        tracing::debug!(url = %record.url, "no content extracted, dropping");
        None
    }
}

/// Extract every candidate with at most `concurrency` fetches in flight.
/// Records keep the candidates' order; failed or empty pages are dropped.
pub async fn extract_records(
    client: &reqwest::Client,
    candidates: Vec<Candidate>,
    rules: &ExtractionRules,
    concurrency: usize,
) -> Vec<ResultRecord> {
    stream::iter(candidates)
        .map(|candidate| extract_record(client, candidate, rules))
        .buffered(concurrency.max(1))
        .filter_map(|record| async move { record })
        .collect()
        .await
}
