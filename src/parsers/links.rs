use url::Url;

/// Resolves an anchor target to an absolute, followable URL.
///
/// Relative references resolve against `base_href` (the page's `<base href>`,
/// itself relative to the page) when present, otherwise against `page_url`.
/// Anything that does not end up as http(s) is not followable and yields
/// `None`.
pub fn resolve(raw_href: &str, page_url: &Url, base_href: Option<&str>) -> Option<Url> {
    let href = raw_href.trim();
    if href.is_empty() {
        return None;
    }

    let base = effective_base(page_url, base_href);
    let resolved = base.join(href).ok()?;

    if is_followable(&resolved) {
        Some(resolved)
    } else {
        ::log::trace!("Dropping non-followable link: {}", resolved);
        None
    }
}

/// The URL relative links on this page are resolved against
pub fn effective_base(page_url: &Url, base_href: Option<&str>) -> Url {
    base_href
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Raw anchor targets that never lead anywhere useful
pub fn is_discardable(raw_href: &str) -> bool {
    let href = raw_href.trim();
    href.is_empty()
        || href.starts_with('#')
        || href
            .get(..11)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("javascript:"))
}

fn is_followable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
}
