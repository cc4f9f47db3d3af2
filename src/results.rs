use crate::error::RequestError;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use url::Url;

/// A validated request to crawl one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub root_url: Url,
    pub keyword: Option<String>,
    pub max_depth: u32,
}

impl CrawlRequest {
    /// Validate caller input. Blank keywords are treated as no keyword.
    pub fn new(
        root_url: &str,
        keyword: Option<&str>,
        max_depth: u32,
    ) -> Result<Self, RequestError> {
        let root_url = Url::parse(root_url.trim()).map_err(|e| RequestError::InvalidUrl {
            url: root_url.to_string(),
            message: e.to_string(),
        })?;

        if !matches!(root_url.scheme(), "http" | "https") {
            return Err(RequestError::UnsupportedScheme(root_url.scheme().to_string()));
        }
        if root_url.host_str().is_none() {
            return Err(RequestError::MissingHost(root_url.to_string()));
        }
        if max_depth == 0 {
            return Err(RequestError::ZeroDepth);
        }

        let keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(Self {
            root_url,
            keyword,
            max_depth,
        })
    }
}

/// Insertion-ordered string mapping. Inserting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<&str> for Fields {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no field named `{key}`"),
        }
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One data row of a table: cell text and resolved cell links, both keyed by
/// column header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowRecord {
    pub cells: Fields,

    #[serde(rename = "_links", skip_serializing_if = "Fields::is_empty")]
    pub links: Fields,
}

impl RowRecord {
    /// First cell whose header looks like a listing title
    pub fn title(&self) -> Option<&str> {
        self.cells
            .iter()
            .find(|(header, _)| {
                let header = header.to_lowercase();
                ["title", "desc", "subject"]
                    .iter()
                    .any(|term| header.contains(term))
            })
            .map(|(_, text)| text)
    }

    /// First link in column order
    pub fn first_link(&self) -> Option<&str> {
        self.links.iter().next().map(|(_, url)| url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResult {
    /// Position among all table-like elements of the page
    pub index: usize,
    pub row_count: usize,
    pub likely_relevant: bool,
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedPage {
    pub url: String,
    pub depth: u32,
    pub title: String,
    pub description: String,
    pub keyword_found: bool,
    pub keyword_context: String,
    pub content_length: usize,
    pub links_found: usize,
    pub tables: Vec<TableResult>,
    pub text_snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedPage {
    pub url: String,
    pub depth: u32,
    pub error: String,
}

/// Outcome of visiting one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageResult {
    Scraped(ScrapedPage),
    Failed(FailedPage),
}

impl PageResult {
    pub fn url(&self) -> &str {
        match self {
            PageResult::Scraped(page) => &page.url,
            PageResult::Failed(page) => &page.url,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            PageResult::Scraped(page) => page.depth,
            PageResult::Failed(page) => page.depth,
        }
    }

    pub fn as_scraped(&self) -> Option<&ScrapedPage> {
        match self {
            PageResult::Scraped(page) => Some(page),
            PageResult::Failed(_) => None,
        }
    }
}

/// Everything one crawl run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlReport {
    pub base_url: String,
    pub total_pages_scraped: usize,
    pub pages: Vec<PageResult>,

    /// Set when the run could not start at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlReport {
    pub fn new(base_url: impl Into<String>, pages: Vec<PageResult>) -> Self {
        Self {
            base_url: base_url.into(),
            total_pages_scraped: pages.len(),
            pages,
            error: None,
        }
    }

    pub fn failed(base_url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            base_url: base_url.into(),
            total_pages_scraped: 0,
            pages: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Every table row that carries a link, as a title/link pair. Rows with
    /// the same fingerprint are reported once, at their first occurrence.
    pub fn listings(&self) -> Vec<Listing> {
        let mut seen = HashSet::new();
        self.pages
            .iter()
            .filter_map(PageResult::as_scraped)
            .flat_map(|page| {
                page.tables
                    .iter()
                    .flat_map(|table| table.rows.iter())
                    .filter_map(move |row| {
                        let url = row.first_link()?;
                        Some(Listing {
                            title: row.title().unwrap_or("Unknown Tender").to_string(),
                            url: url.to_string(),
                            page_url: page.url.clone(),
                        })
                    })
            })
            .filter(|listing| seen.insert(listing.fingerprint()))
            .collect()
    }
}

/// A linked table row, the unit downstream alerting deduplicates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub title: String,
    pub url: String,
    pub page_url: String,
}

impl Listing {
    /// Hex SHA-256 of title followed by url
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}
