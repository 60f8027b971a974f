//! Core types: the search specification, listing candidates, and result records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::ScrapeError;

/// Number of content characters shown by the [`ResultRecord`] display form.
const PREVIEW_CHARS: usize = 197;

/// What to search for: free text or a list of keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    /// A free-text query, sent as-is.
    Text(String),
    /// Keywords, joined with single spaces into one query string.
    Keywords(Vec<String>),
}

impl Query {
    /// Returns the query string sent to the search backend.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Keywords(words) => words.join(" "),
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for Query {
    fn from(words: Vec<String>) -> Self {
        Self::Keywords(words)
    }
}

/// Which kind of sources the listing should contain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Any web page.
    #[default]
    All,
    /// News sources only.
    News,
}

impl SearchKind {
    /// Result-kind code for the `tbm` listing parameter.
    pub fn code(self) -> &'static str {
        match self {
            Self::All => "",
            Self::News => "nws",
        }
    }
}

/// Maximum age of listed pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    #[default]
    Any,
    #[serde(alias = "h")]
    Hour,
    #[serde(alias = "d")]
    Day,
    #[serde(alias = "w")]
    Week,
    #[serde(alias = "m")]
    Month,
    #[serde(alias = "y")]
    Year,
}

impl Recency {
    /// Single-letter recency code, or `None` for [`Recency::Any`].
    pub fn code(self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::Hour => Some("h"),
            Self::Day => Some("d"),
            Self::Week => Some("w"),
            Self::Month => Some("m"),
            Self::Year => Some("y"),
        }
    }
}

/// Language restriction for listed pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Any,
    En,
    Pt,
    Es,
    Fr,
    De,
    It,
}

impl Language {
    /// ISO 639-1 code, or `None` for [`Language::Any`].
    pub fn code(self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::En => Some("en"),
            Self::Pt => Some("pt"),
            Self::Es => Some("es"),
            Self::Fr => Some("fr"),
            Self::De => Some("de"),
            Self::It => Some("it"),
        }
    }
}

/// An immutable set of lowercase HTML tag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Build a tag set, lowercasing names and dropping blanks and duplicates.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for tag in tags {
            let name = tag.as_ref().trim().to_ascii_lowercase();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        Self(names)
    }

    /// Tags scanned for body text by default: paragraphs.
    pub fn content_default() -> Self {
        Self::new(["p"])
    }

    /// Tags removed before scanning by default.
    pub fn exclude_default() -> Self {
        Self::new(["header", "footer", "ul", "li"])
    }

    /// A set with no tags.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if `tag` is in the set (case-insensitive).
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|name| name.eq_ignore_ascii_case(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        Self::new(tags)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0
    }
}

fn default_fetch_n() -> usize {
    10
}

fn default_whitespace_threshold() -> usize {
    15
}

fn default_true() -> bool {
    true
}

/// Everything one harvest call needs to know about what to search for
/// and how to extract page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Query text or keyword list.
    pub query: Query,
    #[serde(default)]
    pub kind: SearchKind,
    #[serde(default)]
    pub recency: Recency,
    #[serde(default)]
    pub language: Language,
    /// Locally staged image for reverse-image search. The caller owns the file.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Target number of valid results.
    #[serde(default = "default_fetch_n")]
    pub fetch_n: usize,
    /// Probe each candidate and drop it unless it answers 200.
    #[serde(default = "default_true")]
    pub drop_unavailable: bool,
    /// Elements scanned for body text.
    #[serde(default = "TagSet::content_default")]
    pub content_tags: TagSet,
    /// Elements removed, subtree included, before scanning.
    #[serde(default = "TagSet::exclude_default")]
    pub exclude_tags: TagSet,
    /// Minimum word count for a text block to count as content.
    #[serde(default = "default_whitespace_threshold")]
    pub whitespace_threshold: usize,
    /// Stop scanning at the first block under the threshold once content has started.
    #[serde(default = "default_true", alias = "break_treshold")]
    pub break_threshold: bool,
}

impl SearchSpec {
    /// A keyword search with default filters and extraction settings.
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            kind: SearchKind::default(),
            recency: Recency::default(),
            language: Language::default(),
            image: None,
            fetch_n: default_fetch_n(),
            drop_unavailable: true,
            content_tags: TagSet::content_default(),
            exclude_tags: TagSet::exclude_default(),
            whitespace_threshold: default_whitespace_threshold(),
            break_threshold: true,
        }
    }

    /// Rejects specifications that cannot produce a meaningful harvest.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.fetch_n == 0 {
            return Err(ScrapeError::Validation(
                "fetch_n must be greater than 0".into(),
            ));
        }
        if self.query.text().trim().is_empty() {
            return Err(ScrapeError::Validation("query must not be empty".into()));
        }
        if self.content_tags.is_empty() {
            return Err(ScrapeError::Validation(
                "content_tags must name at least one tag".into(),
            ));
        }
        Ok(())
    }
}

/// A parsed listing entry before availability and content processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Source name; only present for news listings.
    pub author: Option<String>,
}

/// An image found on a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// The `alt` text, if the element had one.
    pub caption: Option<String>,
    pub url: String,
}

/// One harvested search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub url: String,
    /// Listing title, replaced by the page's own `<title>` after extraction.
    pub title: String,
    /// Snippet shown in the listing.
    pub description: String,
    pub author: Option<String>,
    /// Images in document order.
    pub images: Vec<ImageRef>,
    /// Extracted body text; `None` until extraction has run.
    pub content: Option<String>,
}

impl From<Candidate> for ResultRecord {
    fn from(candidate: Candidate) -> Self {
        Self {
            url: candidate.url,
            title: candidate.title,
            description: candidate.description,
            author: candidate.author,
            images: Vec::new(),
            content: None,
        }
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(ref author) = self.author {
            writeln!(f, "By: {author}")?;
        }
        writeln!(f, "Description: {}", self.description)?;
        let content = self.content.as_deref().unwrap_or_default();
        let preview: String = content.chars().take(PREVIEW_CHARS).collect();
        if content.chars().count() > PREVIEW_CHARS {
            write!(f, "Content: {preview}...")
        } else {
            write!(f, "Content: {preview}")
        }
    }
}
