use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Browser window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Configuration for the crawl-and-extract engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// URL for the WebDriver instance
    pub webdriver_url: String,

    /// Run the browser without a visible window
    pub headless: bool,

    /// User agents handed out round-robin, one per crawl run
    pub user_agents: Vec<String>,

    /// Fixed browser viewport
    pub viewport: Viewport,

    /// Hard limit for navigation plus network settling, in seconds
    pub navigation_timeout_secs: u64,

    /// How long the resource count must stay unchanged to count as settled
    pub quiescence_window_ms: u64,

    /// Bounded wait for a table-like element to appear, in seconds
    pub table_wait_secs: u64,

    /// Maximum number of links followed from each page
    pub link_budget: usize,

    /// Rows kept per table; the rest is dropped silently
    pub max_table_rows: usize,

    /// Characters of context kept on each side of a keyword match
    pub context_radius: usize,

    /// Characters of page text kept in the snippet
    pub snippet_chars: usize,

    /// CSS selector for table-like elements
    pub table_selector: String,

    /// Terms that move a link to the front of the frontier
    pub link_vocabulary: Vec<String>,

    /// Terms that flag a table as likely relevant
    pub table_vocabulary: Vec<String>,

    /// Regex patterns for URLs that are never visited
    pub exclude_patterns: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            user_agents: default_user_agents(),
            viewport: Viewport::default(),
            navigation_timeout_secs: 60,
            quiescence_window_ms: 500,
            table_wait_secs: 5,
            link_budget: 15,
            max_table_rows: 200,
            context_radius: 50,
            snippet_chars: 500,
            table_selector: "table".to_string(),
            link_vocabulary: to_strings(&[
                "tender",
                "bid",
                "latest",
                "active",
                "result",
                "award",
                "procurement",
                "notice",
                "corrigendum",
            ]),
            table_vocabulary: to_strings(&[
                "tender",
                "bid",
                "ref",
                "opening",
                "date",
                "award",
                "contract",
                "id",
                "no",
                "title",
                "subject",
                "organisation",
                "organization",
                "published",
                "closing",
                "corrigendum",
                "nit",
                "aoc",
                "download",
            ]),
            exclude_patterns: vec![
                r"(?i)\.(jpg|jpeg|png|gif|css|js|ico|svg|woff|woff2|ttf|eot|pdf|docx?|xlsx?|zip|rar)$".to_string(),
            ],
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the `WEBDRIVER_URL` environment override, if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Check the settings that would otherwise fail deep inside a crawl
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agents.is_empty() {
            return Err(ConfigError::Invalid(
                "user_agents must contain at least one entry".to_string(),
            ));
        }
        if self.link_budget == 0 {
            return Err(ConfigError::Invalid(
                "link_budget must be positive".to_string(),
            ));
        }
        self.compile_exclude_patterns()?;
        Ok(())
    }

    pub(crate) fn compile_exclude_patterns(&self) -> Result<Vec<Regex>, regex::Error> {
        self.exclude_patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect()
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_agents() -> Vec<String> {
    to_strings(&[
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    ])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScraperConfig::from_json(r#"{"link_budget": 3, "headless": false}"#).unwrap();
        assert_eq!(config.link_budget, 3);
        assert!(!config.headless);
        assert_eq!(config.max_table_rows, 200);
        assert_eq!(config.viewport, Viewport { width: 1920, height: 1080 });
        assert_eq!(config.webdriver_url, "http://localhost:4444");
    }

    #[test]
    fn test_rejects_empty_user_agent_pool() {
        let err = ScraperConfig::from_json(r#"{"user_agents": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_exclude_pattern() {
        let err = ScraperConfig::from_json(r#"{"exclude_patterns": ["(unclosed"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern(_)));
    }

    #[test]
    fn test_default_excludes_static_assets() {
        let patterns = ScraperConfig::default().compile_exclude_patterns().unwrap();
        assert!(patterns.iter().any(|r| r.is_match("https://x.com/logo.PNG")));
        assert!(!patterns.iter().any(|r| r.is_match("https://x.com/tenders")));
    }
}
