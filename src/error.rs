use thiserror::Error;

/// Failure to render a single page. Recorded in the report, never fatal.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("timed out after {secs}s waiting for {url} to settle")]
    Timeout { url: String, secs: u64 },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("browser session error: {0}")]
    Session(String),
}

/// Failure while pulling structure out of a rendered page.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

/// The browser session for a crawl run could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to connect to WebDriver at {url}: {message}")]
    Connect { url: String, message: String },

    #[error("failed to configure browser session: {0}")]
    Setup(String),
}

/// A crawl request that cannot be run as given.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid root URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("unsupported scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),

    #[error("root URL `{0}` has no host")]
    MissingHost(String),

    #[error("max depth must be at least 1")]
    ZeroDepth,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
