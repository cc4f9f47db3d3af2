use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Visited-set and link ordering for a single crawl run.
///
/// Containment is strict: only URLs whose host equals the root host exactly are
/// visited. Subdomains count as foreign.
#[derive(Debug)]
pub struct Frontier {
    base_host: String,
    visited: HashSet<String>,
    exclude_regexes: Vec<Regex>,
    vocabulary: Vec<String>,
    link_budget: usize,
}

impl Frontier {
    /// Create a frontier rooted at `root_url`
    pub fn new(
        root_url: &Url,
        exclude_regexes: Vec<Regex>,
        vocabulary: &[String],
        link_budget: usize,
    ) -> Self {
        Self {
            base_host: root_url.host_str().unwrap_or_default().to_string(),
            visited: HashSet::new(),
            exclude_regexes,
            vocabulary: vocabulary.iter().map(|t| t.to_lowercase()).collect(),
            link_budget,
        }
    }

    /// Whether `url` may be visited: in scope, not excluded and not seen yet
    pub fn should_visit(&self, url: &Url) -> bool {
        if !should_visit(url, &self.visited, &self.base_host) {
            return false;
        }

        let url_str = url.as_str();
        if let Some(regex) = self.exclude_regexes.iter().find(|r| r.is_match(url_str)) {
            ::log::debug!("URL filter rejected {} (pattern {})", url, regex);
            return false;
        }
        true
    }

    /// Records `url` as visited. Returns false if it already was.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(normalize_url(url).into())
    }

    /// Orders outbound links for expansion, capped at the link budget
    pub fn prioritize(&self, links: Vec<Url>) -> Vec<Url> {
        prioritize(links, &self.vocabulary, self.link_budget)
    }
}

/// A URL is eligible when it has a scheme and host, the host equals
/// `base_host` exactly, and its normalized form is not in `visited`.
pub fn should_visit(url: &Url, visited: &HashSet<String>, base_host: &str) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if url.scheme().is_empty() {
        return false;
    }
    if host != base_host {
        ::log::debug!("Skipping external link: {}", url);
        return false;
    }
    !visited.contains(normalize_url(url).as_str())
}

/// Splits links into vocabulary matches and the rest, keeps discovery order
/// inside each bucket, puts matches first and truncates to `limit`.
pub fn prioritize(links: Vec<Url>, vocabulary: &[String], limit: usize) -> Vec<Url> {
    let (mut relevant, other): (Vec<Url>, Vec<Url>) = links.into_iter().partition(|link| {
        let lowered = link.as_str().to_lowercase();
        vocabulary
            .iter()
            .any(|term| lowered.contains(term.to_lowercase().as_str()))
    });

    relevant.extend(other);
    relevant.truncate(limit);
    relevant
}

/// Create a normalized version of the URL (e.g., removing fragments)
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}
