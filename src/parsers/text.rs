//! Plain-text helpers shared by the page extractors.
//!
//! All positions and lengths here are counted in `char`s, so a context window
//! of 50 never splits a multi-byte character.

/// Ellipsis marker wrapped around context windows and snippets
pub const ELLIPSIS: &str = "...";

/// Collapses every run of whitespace into a single space and trims the ends
pub fn normalize_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins text fragments with single spaces, dropping fragments that are empty
/// once stripped
pub fn join_fragments<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for fragment in fragments {
        let fragment = normalize_whitespace(fragment);
        if fragment.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&fragment);
    }
    out
}

/// Finds the first case-insensitive occurrence of `needle` in `haystack`.
///
/// Returns the `[start, end)` char range of the match in `haystack`.
pub fn find_case_insensitive(haystack: &[char], needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    for start in 0..haystack.len() {
        let mut matched = 0;
        let mut end = start;
        while end < haystack.len() && matched < needle.len() {
            let mut ok = true;
            for c in haystack[end].to_lowercase() {
                if matched >= needle.len() || needle[matched] != c {
                    ok = false;
                    break;
                }
                matched += 1;
            }
            if !ok {
                break;
            }
            end += 1;
        }
        if matched == needle.len() {
            return Some((start, end));
        }
    }
    None
}

/// Result of looking for the search keyword in page text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMatch {
    pub found: bool,
    pub context: String,
}

/// Looks for `keyword` in `text` and cuts a window of `radius` chars on each
/// side of the first match, wrapped in ellipsis markers.
pub fn keyword_context(text: &str, keyword: Option<&str>, radius: usize) -> KeywordMatch {
    let Some(keyword) = keyword.filter(|k| !k.trim().is_empty()) else {
        return KeywordMatch::default();
    };

    let chars: Vec<char> = text.chars().collect();
    match find_case_insensitive(&chars, keyword) {
        Some((start, end)) => {
            let from = start.saturating_sub(radius);
            let to = (end + radius).min(chars.len());
            let window: String = chars[from..to].iter().collect();
            KeywordMatch {
                found: true,
                context: format!("{ELLIPSIS}{window}{ELLIPSIS}"),
            }
        }
        None => KeywordMatch::default(),
    }
}

/// First `limit` chars of `text` followed by an ellipsis marker
pub fn snippet(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_join_fragments_skips_blank() {
        assert_eq!(join_fragments(["Hello", "  ", "\n world \n", ""]), "Hello world");
    }

    #[test]
    fn test_find_case_insensitive() {
        let chars: Vec<char> = "Open TENDER notice".chars().collect();
        assert_eq!(find_case_insensitive(&chars, "tender"), Some((5, 11)));
        assert_eq!(find_case_insensitive(&chars, "bid"), None);
        assert_eq!(find_case_insensitive(&chars, ""), None);
    }

    #[test]
    fn test_context_is_clamped_at_text_bounds() {
        let m = keyword_context("Budget for 2024", Some("budget"), 50);
        assert!(m.found);
        assert_eq!(m.context, "...Budget for 2024...");
    }

    #[test]
    fn test_context_window_radius() {
        let text = format!("{}needle{}", "a".repeat(80), "b".repeat(80));
        let m = keyword_context(&text, Some("NEEDLE"), 50);
        assert!(m.found);
        assert_eq!(m.context, format!("...{}needle{}...", "a".repeat(50), "b".repeat(50)));
        assert_eq!(m.context.chars().count(), 100 + "needle".len() + 6);
    }

    #[test]
    fn test_missing_or_absent_keyword() {
        assert_eq!(keyword_context("some text", None, 50), KeywordMatch::default());
        assert_eq!(keyword_context("some text", Some("budget"), 50), KeywordMatch::default());
        assert_eq!(keyword_context("some text", Some("  "), 50), KeywordMatch::default());
    }

    #[test]
    fn test_context_handles_multibyte_text() {
        let text = format!("{}Ausschreibung für Straßenbau{}", "é".repeat(60), "ü".repeat(60));
        let m = keyword_context(&text, Some("straßenbau"), 50);
        assert!(m.found);
        assert!(m.context.to_lowercase().contains("straßenbau"));
    }

    #[test]
    fn test_snippet_always_appends_ellipsis() {
        assert_eq!(snippet("short", 500), "short...");
        assert_eq!(snippet(&"x".repeat(600), 500).chars().count(), 503);
    }
}
