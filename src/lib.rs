//! Keyword-driven crawler that renders pages in a real browser and pulls
//! tender listings out of their tables.

pub mod config;
pub mod crawlers;
pub mod error;
pub mod frontier;
pub mod parsers;
pub mod results;

// Re-export commonly used types for convenience
pub use config::ScraperConfig;
pub use crawlers::{BrowserLauncher, Crawler, PageRenderer, WebDriverLauncher};
pub use error::{ConfigError, LaunchError, RenderError, RequestError};
pub use results::{CrawlReport, CrawlRequest, Listing, PageResult, ScrapedPage, TableResult};
