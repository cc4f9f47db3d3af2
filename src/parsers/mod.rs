pub mod html;
pub mod links;
pub mod tables;
pub mod text;


use crate::config::ScraperConfig;
use crate::results::TableResult;
use html::PageContent;
use scraper::Html;
use tables::TableOptions;
use url::Url;

/// Everything extracted from one rendered page
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub content: PageContent,
    /// Outbound links resolved to absolute http(s) URLs, in document order
    pub links: Vec<Url>,
    pub tables: Vec<TableResult>,
}

/// Runs the content, link and table extractors over one DOM snapshot.
///
/// A table extraction failure is logged and leaves the table list empty; the
/// rest of the page is still returned.
pub fn parse_page(
    html: &str,
    page_url: &Url,
    keyword: Option<&str>,
    config: &ScraperConfig,
) -> ParseResult {
    let doc = Html::parse_document(html);
    let content = html::extract(&doc, keyword, config.context_radius);

    let base = links::effective_base(page_url, content.base_href.as_deref());
    let resolved: Vec<Url> = content
        .links
        .iter()
        .filter_map(|href| links::resolve(href, &base, None))
        .collect();

    let options = TableOptions {
        selector: &config.table_selector,
        vocabulary: &config.table_vocabulary,
        max_rows: config.max_table_rows,
    };
    let tables = match tables::extract_tables(&doc, &base, &options) {
        Ok(tables) => tables,
        Err(e) => {
            ::log::warn!("Table extraction failed for {}: {}", page_url, e);
            Vec::new()
        }
    };

    ParseResult {
        content,
        links: resolved,
        tables,
    }
}
