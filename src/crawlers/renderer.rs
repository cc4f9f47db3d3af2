use crate::error::{LaunchError, RenderError};
use async_trait::async_trait;
use url::Url;

/// DOM snapshot of a page after it finished loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL the browser ended up on
    pub url: Url,
    /// Serialized DOM
    pub html: String,
    pub title: String,
}

/// One browser session, used by exactly one crawl run
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigate to `url`, wait for it to settle and capture the DOM
    async fn render(&mut self, url: &Url) -> Result<RenderedPage, RenderError>;

    /// End the session. Called once at the end of every run.
    async fn shutdown(self: Box<Self>);
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, user_agent: &str) -> Result<Box<dyn PageRenderer>, LaunchError>;
}
