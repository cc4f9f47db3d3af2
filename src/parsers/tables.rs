//! Heuristic detection of listing tables.
//!
//! The first row of every table-like element is taken as its header row.
//! A table is kept when its text mentions one of the configured vocabulary
//! terms, or when it is structurally a data table (more than two data rows and
//! more than one column).

use crate::error::ExtractionError;
use crate::parsers::{links, text};
use crate::results::{RowRecord, TableResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Knobs for table extraction, borrowed from the engine configuration
#[derive(Debug, Clone, Copy)]
pub struct TableOptions<'a> {
    /// CSS selector for table-like elements
    pub selector: &'a str,
    /// Lowercase terms that flag a table as likely relevant
    pub vocabulary: &'a [String],
    /// Rows kept per table
    pub max_rows: usize,
}

/// Extracts candidate tables from `doc`, resolving cell links against
/// `base_url`.
pub fn extract_tables(
    doc: &Html,
    base_url: &Url,
    options: &TableOptions<'_>,
) -> Result<Vec<TableResult>, ExtractionError> {
    let table_selector =
        Selector::parse(options.selector).map_err(|e| ExtractionError::Selector {
            selector: options.selector.to_string(),
            message: e.to_string(),
        })?;

    let mut tables = Vec::new();
    for (index, table) in doc.select(&table_selector).enumerate() {
        if let Some(result) = extract_table(index, table, &table_selector, base_url, options) {
            tables.push(result);
        }
    }

    ::log::debug!("Table extractor kept {} tables", tables.len());
    Ok(tables)
}

fn extract_table(
    index: usize,
    table: ElementRef<'_>,
    table_selector: &Selector,
    base_url: &Url,
    options: &TableOptions<'_>,
) -> Option<TableResult> {
    let mut rows = own_rows(table, table_selector);
    let header_row = rows.next()?;

    let headers: Vec<String> = cells(header_row)
        .enumerate()
        .map(|(i, cell)| {
            let label = cell_text(cell);
            if label.is_empty() { format!("Col_{i}") } else { label }
        })
        .collect();

    let anchor_selector = Selector::parse("a[href]").unwrap();
    let mut records = Vec::new();
    for row in rows {
        let mut record = RowRecord::default();
        let mut has_text = false;

        for (header, cell) in headers.iter().zip(cells(row)) {
            let value = cell_text(cell);
            has_text |= !value.is_empty();
            record.cells.insert(header.as_str(), value);

            if let Some(link) = cell_link(cell, &anchor_selector, base_url) {
                record.links.insert(header.as_str(), link.to_string());
            }
        }

        if has_text {
            records.push(record);
        }
    }

    let likely_relevant = is_likely_relevant(table, options.vocabulary);
    let substantial = records.len() > 2 && headers.len() > 1;
    if !likely_relevant && !substantial {
        ::log::trace!("Skipping table {} with {} rows", index, records.len());
        return None;
    }

    records.truncate(options.max_rows);

    Some(TableResult {
        index,
        row_count: records.len(),
        likely_relevant,
        headers,
        rows: records,
    })
}

/// `tr` elements that belong to `table` itself and not to a nested table
fn own_rows<'a>(
    table: ElementRef<'a>,
    table_selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let row_selector = Selector::parse("tr").unwrap();
    let rows: Vec<ElementRef<'a>> = table.select(&row_selector).collect();
    rows.into_iter()
        .filter(move |row| owning_table(*row, table_selector) == Some(table))
}

fn owning_table<'a>(row: ElementRef<'a>, table_selector: &Selector) -> Option<ElementRef<'a>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table" || table_selector.matches(el))
}

fn cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    text::join_fragments(cell.text())
}

/// First anchor in the cell that resolves to a followable URL
fn cell_link(cell: ElementRef<'_>, anchor_selector: &Selector, base_url: &Url) -> Option<Url> {
    cell.select(anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !links::is_discardable(href))
        .find_map(|href| links::resolve(&href.trim().replace(' ', "%20"), base_url, None))
}

fn is_likely_relevant(table: ElementRef<'_>, vocabulary: &[String]) -> bool {
    let content = text::join_fragments(table.text()).to_lowercase();
    vocabulary
        .iter()
        .any(|term| content.contains(term.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;

    fn extract(html: &str) -> Vec<TableResult> {
        let config = ScraperConfig::default();
        extract_with(html, &config)
    }

    fn extract_with(html: &str, config: &ScraperConfig) -> Vec<TableResult> {
        let options = TableOptions {
            selector: &config.table_selector,
            vocabulary: &config.table_vocabulary,
            max_rows: config.max_table_rows,
        };
        let base = Url::parse("https://x.com/a/b").unwrap();
        extract_tables(&Html::parse_document(html), &base, &options).unwrap()
    }

    #[test]
    fn test_header_and_linked_row() {
        let tables = extract(
            r#"<table>
                 <tr><th>Title</th><th>Date</th></tr>
                 <tr><td><a href="/t/road repair">Road Repair</a></td><td>2024-01-01</td></tr>
               </table>"#,
        );
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert!(table.likely_relevant);
        assert_eq!(table.row_count, 1);
        assert_eq!(table.headers, vec!["Title", "Date"]);
        let row = &table.rows[0];
        assert_eq!(&row.cells["Title"], "Road Repair");
        assert_eq!(&row.cells["Date"], "2024-01-01");
        assert_eq!(&row.links["Title"], "https://x.com/t/road%20repair");
        assert_eq!(row.links.get("Date"), None);
    }

    #[test]
    fn test_empty_headers_get_placeholders() {
        let tables = extract(
            r#"<table>
                 <tr><th></th><th>Tender</th><th> </th></tr>
                 <tr><td>1</td><td>Bridge</td><td>x</td></tr>
               </table>"#,
        );
        assert_eq!(tables[0].headers, vec!["Col_0", "Tender", "Col_2"]);
        assert_eq!(&tables[0].rows[0].cells["Col_2"], "x");
    }

    #[test]
    fn test_extra_cells_dropped_and_blank_rows_skipped() {
        let tables = extract(
            r#"<table>
                 <tr><th>Tender</th><th>Closing</th></tr>
                 <tr><td>A</td><td>B</td><td>overflow</td></tr>
                 <tr><td> </td><td></td></tr>
                 <tr><td>C</td></tr>
               </table>"#,
        );
        let table = &tables[0];
        assert_eq!(table.row_count, 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 1);
        assert_eq!(&table.rows[1].cells["Tender"], "C");
    }

    #[test]
    fn test_structural_admission_without_vocabulary() {
        let mut config = ScraperConfig::default();
        config.table_vocabulary = vec!["tender".to_string()];

        let layout = r#"<table>
            <tr><td>Home</td><td>About</td></tr>
            <tr><td>Help</td><td>Contact</td></tr>
          </table>"#;
        assert!(extract_with(layout, &config).is_empty());

        let grid = r#"<table>
            <tr><th>Item</th><th>Qty</th></tr>
            <tr><td>Pipe</td><td>4</td></tr>
            <tr><td>Valve</td><td>2</td></tr>
            <tr><td>Pump</td><td>1</td></tr>
          </table>"#;
        let tables = extract_with(grid, &config);
        assert_eq!(tables.len(), 1);
        assert!(!tables[0].likely_relevant);

        let single_column = r#"<table>
            <tr><th>Item</th></tr>
            <tr><td>Pipe</td></tr><tr><td>Valve</td></tr><tr><td>Pump</td></tr>
          </table>"#;
        assert!(extract_with(single_column, &config).is_empty());
    }

    #[test]
    fn test_rows_are_capped() {
        let mut html = String::from("<table><tr><th>Tender</th><th>Date</th></tr>");
        for i in 0..250 {
            html.push_str(&format!("<tr><td>T{i}</td><td>2024</td></tr>"));
        }
        html.push_str("</table>");

        let tables = extract(&html);
        assert_eq!(tables[0].row_count, 200);
        assert_eq!(tables[0].rows.len(), 200);
        assert_eq!(&tables[0].rows[199].cells["Tender"], "T199");
    }

    #[test]
    fn test_nested_tables_keep_their_own_rows() {
        let tables = extract(
            r#"<table>
                 <tr><th>Tender</th><th>Detail</th></tr>
                 <tr><td>Outer</td><td>
                   <table><tr><th>Bid</th></tr><tr><td>Inner</td></tr></table>
                 </td></tr>
               </table>"#,
        );
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].index, 0);
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[1].index, 1);
        assert_eq!(tables[1].headers, vec!["Bid"]);
        assert_eq!(&tables[1].rows[0].cells["Bid"], "Inner");
    }

    #[test]
    fn test_script_links_in_cells_are_ignored() {
        let tables = extract(
            r##"<table>
                 <tr><th>Title</th><th>Document</th></tr>
                 <tr><td><a href="javascript:show(1)">Show</a></td>
                     <td><a href="#">x</a><a href="docs/nit 1.pdf">NIT</a></td></tr>
               </table>"##,
        );
        let row = &tables[0].rows[0];
        assert_eq!(row.links.get("Title"), None);
        assert_eq!(&row.links["Document"], "https://x.com/a/docs/nit%201.pdf");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let options = TableOptions {
            selector: "table[",
            vocabulary: &[],
            max_rows: 200,
        };
        let base = Url::parse("https://x.com/").unwrap();
        let err = extract_tables(&Html::parse_document("<table></table>"), &base, &options)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Selector { .. }));
    }
}
