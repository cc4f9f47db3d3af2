use crate::parsers::text::{self, KeywordMatch};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Description reported when a page has no `<meta name="description">`
pub const NO_DESCRIPTION: &str = "No description found";

/// Elements whose text never shows up on screen. `noscript` fallback text
/// still counts as page text.
const INVISIBLE: &[&str] = &["script", "style", "template"];

/// Text, metadata and raw links pulled out of one rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub description: String,
    pub text: String,
    pub keyword_found: bool,
    pub keyword_context: String,
    /// Anchor targets, trimmed, with fragment-only and script targets removed
    pub links: Vec<String>,
    /// Value of the first `<base href>`, if any
    pub base_href: Option<String>,
}

/// Extracts content from an already parsed document
pub fn extract(doc: &Html, keyword: Option<&str>, context_radius: usize) -> PageContent {
    let text = visible_text(doc);
    let KeywordMatch { found, context } = text::keyword_context(&text, keyword, context_radius);

    let links = raw_links(doc);
    ::log::debug!("HTML parser found {} links", links.len());

    PageContent {
        title: title(doc).unwrap_or_default(),
        description: description(doc).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        text,
        keyword_found: found,
        keyword_context: context,
        links,
        base_href: base_href(doc),
    }
}

/// Parses `html` and extracts its content
pub fn parse(html: &str, keyword: Option<&str>, context_radius: usize) -> PageContent {
    extract(&Html::parse_document(html), keyword, context_radius)
}

/// All stripped text nodes outside invisible elements, joined by single spaces
pub fn visible_text(doc: &Html) -> String {
    let fragments = doc.tree.root().descendants().filter_map(|node| {
        let Node::Text(text) = node.value() else {
            return None;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| INVISIBLE.contains(&el.value().name()));
        if hidden { None } else { Some(&**text) }
    });
    text::join_fragments(fragments)
}

fn title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").unwrap();
    doc.select(&selector)
        .next()
        .map(|el| text::normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn description(doc: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name]").unwrap();
    doc.select(&selector)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
}

fn base_href(doc: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").unwrap();
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn raw_links(doc: &Html) -> Vec<String> {
    let selector = Selector::parse("a[href]").unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !super::links::is_discardable(href))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html>
          <head>
            <title> Active   Tenders </title>
            <meta name="Description" content=" State procurement portal ">
            <style>.x { color: red }</style>
            <script>var budget = 1;</script>
          </head>
          <body>
            <h1>Open tenders</h1>
            <p>Road repair
               in district 4</p>
            <a href=" /tenders?page=2 ">Next</a>
            <a href="#top">Top</a>
            <a href="javascript:void(0)">Print</a>
            <a href="">Empty</a>
            <noscript>Enable JavaScript</noscript>
          </body>
        </html>
    "##;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let content = parse(PAGE, None, 50);
        assert_eq!(
            content.text,
            "Active Tenders Open tenders Road repair in district 4 Next Top Print Empty \
             Enable JavaScript"
        );
    }

    #[test]
    fn test_noscript_text_counts_for_keywords() {
        let html = "<body><noscript>Tender notices need JavaScript</noscript></body>";
        let content = parse(html, Some("tender"), 50);
        assert!(content.keyword_found);
        assert_eq!(content.text, "Tender notices need JavaScript");
    }

    #[test]
    fn test_metadata() {
        let content = parse(PAGE, None, 50);
        assert_eq!(content.title, "Active Tenders");
        assert_eq!(content.description, "State procurement portal");
        assert_eq!(content.base_href, None);
    }

    #[test]
    fn test_missing_description_uses_sentinel() {
        let content = parse("<html><body><p>x</p></body></html>", None, 50);
        assert_eq!(content.description, NO_DESCRIPTION);
        assert_eq!(content.title, "");
    }

    #[test]
    fn test_links_are_trimmed_and_filtered() {
        let content = parse(PAGE, None, 50);
        assert_eq!(content.links, vec!["/tenders?page=2".to_string()]);
    }

    #[test]
    fn test_keyword_lookup() {
        let content = parse(PAGE, Some("ROAD"), 50);
        assert!(content.keyword_found);
        assert!(content.keyword_context.starts_with("..."));
        assert!(content.keyword_context.contains("Road repair"));

        // Script text is not visible, so it does not count as a match
        let content = parse(PAGE, Some("budget"), 50);
        assert!(!content.keyword_found);
        assert_eq!(content.keyword_context, "");
    }

    #[test]
    fn test_base_href() {
        let content = parse(
            r#"<html><head><base href="/portal/"></head><body></body></html>"#,
            None,
            50,
        );
        assert_eq!(content.base_href.as_deref(), Some("/portal/"));
    }
}
