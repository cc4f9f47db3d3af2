use crate::config::ScraperConfig;
use crate::crawlers::renderer::{BrowserLauncher, PageRenderer, RenderedPage};
use crate::crawlers::web::WebDriverLauncher;
use crate::error::ConfigError;
use crate::frontier::Frontier;
use crate::parsers::{self, text};
use crate::results::{CrawlReport, CrawlRequest, FailedPage, PageResult, ScrapedPage};
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Hands out user agents round-robin, one per crawl run
#[derive(Debug)]
pub struct AgentRotation {
    agents: Vec<String>,
    next: AtomicUsize,
}

impl AgentRotation {
    pub fn new(agents: Vec<String>) -> Self {
        Self {
            agents,
            next: AtomicUsize::new(0),
        }
    }

    /// The agent for the next session, or an empty string for an empty pool
    pub fn next(&self) -> &str {
        if self.agents.is_empty() {
            return "";
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[i]
    }
}

/// The crawl-and-extract engine.
///
/// One `Crawler` can serve any number of crawl runs, including concurrent ones.
/// Each run gets its own browser session, visited set and worklist.
pub struct Crawler<L = WebDriverLauncher> {
    config: ScraperConfig,
    launcher: L,
    agents: AgentRotation,
    exclude_regexes: Vec<Regex>,
}

impl Crawler<WebDriverLauncher> {
    /// Create an engine that renders through the configured WebDriver
    pub fn new(config: ScraperConfig) -> Result<Self, ConfigError> {
        let launcher = WebDriverLauncher::new(&config);
        Self::with_launcher(config, launcher)
    }
}

impl<L: BrowserLauncher> Crawler<L> {
    /// Create an engine with a custom browser launcher
    pub fn with_launcher(config: ScraperConfig, launcher: L) -> Result<Self, ConfigError> {
        config.validate()?;
        let exclude_regexes = config.compile_exclude_patterns()?;
        Ok(Self {
            agents: AgentRotation::new(config.user_agents.clone()),
            config,
            launcher,
            exclude_regexes,
        })
    }

    /// Validates caller input and crawls. Invalid input yields a single-error
    /// report rather than an error.
    pub async fn crawl_url(
        &self,
        root_url: &str,
        keyword: Option<&str>,
        max_depth: u32,
    ) -> CrawlReport {
        match CrawlRequest::new(root_url, keyword, max_depth) {
            Ok(request) => self.crawl(request).await,
            Err(e) => {
                ::log::error!("Rejected crawl request for {}: {}", root_url, e);
                CrawlReport::failed(root_url, e)
            }
        }
    }

    /// Runs one crawl. Never fails: page failures become error entries and a
    /// session that cannot start becomes a report without pages.
    pub async fn crawl(&self, request: CrawlRequest) -> CrawlReport {
        let base_url = request.root_url.to_string();
        ::log::info!(
            "Starting crawl of {} (keyword: {:?}, max depth: {})",
            base_url,
            request.keyword,
            request.max_depth
        );

        let mut renderer = match self.launcher.launch(self.agents.next()).await {
            Ok(renderer) => renderer,
            Err(e) => {
                ::log::error!("Failed to start browser for {}: {}", base_url, e);
                return CrawlReport::failed(base_url, e);
            }
        };

        let pages = self.traverse(&request, renderer.as_mut()).await;
        renderer.shutdown().await;

        ::log::info!("Crawl of {} complete - {} pages", base_url, pages.len());
        CrawlReport::new(base_url, pages)
    }

    /// Depth-first walk over an explicit worklist. Children are pushed in
    /// reverse priority order so the highest-priority link is expanded first.
    async fn traverse(
        &self,
        request: &CrawlRequest,
        renderer: &mut dyn PageRenderer,
    ) -> Vec<PageResult> {
        let mut frontier = Frontier::new(
            &request.root_url,
            self.exclude_regexes.clone(),
            &self.config.link_vocabulary,
            self.config.link_budget,
        );
        let mut pages = Vec::new();
        let mut worklist = vec![(request.root_url.clone(), 1u32)];

        while let Some((url, depth)) = worklist.pop() {
            if depth > request.max_depth || !frontier.should_visit(&url) {
                continue;
            }
            frontier.mark_visited(&url);
            ::log::info!("Crawling: {} (depth {})", url, depth);

            let rendered = match renderer.render(&url).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    ::log::error!("Error crawling {}: {}", url, e);
                    pages.push(PageResult::Failed(FailedPage {
                        url: url.to_string(),
                        depth,
                        error: e.to_string(),
                    }));
                    continue;
                }
            };

            let (page, links) = self.process_page(&url, depth, request, rendered);
            pages.push(PageResult::Scraped(page));

            if depth < request.max_depth {
                let next = frontier.prioritize(links);
                ::log::debug!("Queuing {} links from {}", next.len(), url);
                worklist.extend(next.into_iter().rev().map(|link| (link, depth + 1)));
            }
        }

        pages
    }

    /// Runs the extractors over a rendered page
    fn process_page(
        &self,
        url: &Url,
        depth: u32,
        request: &CrawlRequest,
        rendered: RenderedPage,
    ) -> (ScrapedPage, Vec<Url>) {
        let parsed = parsers::parse_page(
            &rendered.html,
            &rendered.url,
            request.keyword.as_deref(),
            &self.config,
        );
        let content = parsed.content;

        ::log::info!("Found {} links in {}", parsed.links.len(), url);
        if content.keyword_found {
            ::log::info!("Keyword found on {}", url);
        }

        let title = if rendered.title.trim().is_empty() {
            content.title
        } else {
            rendered.title.trim().to_string()
        };

        let page = ScrapedPage {
            url: url.to_string(),
            depth,
            title,
            description: content.description,
            keyword_found: content.keyword_found,
            keyword_context: content.keyword_context,
            content_length: content.text.chars().count(),
            links_found: parsed.links.len(),
            tables: parsed.tables,
            text_snippet: text::snippet(&content.text, self.config.snippet_chars),
        };
        (page, parsed.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_rotation_cycles() {
        let rotation = AgentRotation::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(rotation.next(), "a");
        assert_eq!(rotation.next(), "b");
        assert_eq!(rotation.next(), "a");
    }

    #[test]
    fn test_empty_rotation() {
        assert_eq!(AgentRotation::new(Vec::new()).next(), "");
    }
}
