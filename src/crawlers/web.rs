use crate::config::{ScraperConfig, Viewport};
use crate::crawlers::renderer::{BrowserLauncher, PageRenderer, RenderedPage};
use crate::error::{LaunchError, RenderError};
use async_trait::async_trait;
use fantoccini::wd::{Capabilities, TimeoutConfiguration, WindowHandle};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use url::Url;

/// Interval between network-activity probes while waiting for a page to settle
const SETTLE_POLL: Duration = Duration::from_millis(100);

/// Reports the load state and how many resources the page has fetched so far
const SETTLE_PROBE: &str = r#"
    return [document.readyState, performance.getEntriesByType('resource').length];
"#;

/// Starts WebDriver sessions (ChromeDriver, geckodriver, Selenium)
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    headless: bool,
    viewport: Viewport,
    timeouts: Timeouts,
    table_selector: String,
}

#[derive(Debug, Clone, Copy)]
struct Timeouts {
    navigation: Duration,
    quiescence: Duration,
    table_wait: Duration,
}

impl WebDriverLauncher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            viewport: config.viewport,
            timeouts: Timeouts {
                navigation: Duration::from_secs(config.navigation_timeout_secs),
                quiescence: Duration::from_millis(config.quiescence_window_ms),
                table_wait: Duration::from_secs(config.table_wait_secs),
            },
            table_selector: config.table_selector.clone(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, user_agent: &str) -> Result<Box<dyn PageRenderer>, LaunchError> {
        let capabilities = capabilities(self.headless, user_agent, self.viewport);
        let client = connect(
            &self.webdriver_url,
            &capabilities,
            self.viewport,
            self.timeouts.navigation,
        )
        .await?;

        let base_window = client
            .window()
            .await
            .map_err(|e| LaunchError::Setup(e.to_string()))?;

        ::log::info!("Browser session started at {}", self.webdriver_url);
        ::log::debug!("Session user agent: {}", user_agent);

        Ok(Box::new(WebDriverSession {
            client,
            base_window,
            capabilities,
            launcher: self.clone(),
        }))
    }
}

/// Connects to the WebDriver instance and applies the fixed viewport and the
/// driver-side page load timeout
async fn connect(
    webdriver_url: &str,
    capabilities: &Capabilities,
    viewport: Viewport,
    navigation: Duration,
) -> Result<Client, LaunchError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities.clone());

    let client = builder
        .connect(webdriver_url)
        .await
        .map_err(|e| LaunchError::Connect {
            url: webdriver_url.to_string(),
            message: e.to_string(),
        })?;

    let Viewport { width, height } = viewport;
    if let Err(e) = client.set_window_size(width, height).await {
        ::log::warn!("Failed to set window size {}x{}: {}", width, height, e);
    }

    // A timed-out goto keeps the driver busy until its own page load limit
    if let Err(e) = client.update_timeouts(driver_timeouts(navigation)).await {
        ::log::warn!("Failed to set page load timeout: {}", e);
    }

    Ok(client)
}

fn driver_timeouts(navigation: Duration) -> TimeoutConfiguration {
    TimeoutConfiguration::new(None, Some(navigation), None)
}

/// Browser capabilities for a session with a fixed identity and viewport.
///
/// Both Chrome and Firefox options are set; each driver ignores the other's.
fn capabilities(headless: bool, user_agent: &str, viewport: Viewport) -> Capabilities {
    let mut chrome_args = vec![
        format!("--user-agent={user_agent}"),
        format!("--window-size={},{}", viewport.width, viewport.height),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
    ];
    let mut firefox_args = vec![
        format!("--width={}", viewport.width),
        format!("--height={}", viewport.height),
    ];
    if headless {
        chrome_args.push("--headless=new".to_string());
        firefox_args.push("-headless".to_string());
    }

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": firefox_args,
            "prefs": { "general.useragent.override": user_agent }
        }),
    );
    caps
}

/// A live browser session. Each rendered URL gets its own tab, which is closed
/// as soon as the DOM has been captured.
struct WebDriverSession {
    client: Client,
    base_window: WindowHandle,
    capabilities: Capabilities,
    launcher: WebDriverLauncher,
}

/// A tab opened for one URL
struct Tab {
    handle: WindowHandle,
    closed: bool,
}

#[async_trait]
impl PageRenderer for WebDriverSession {
    async fn render(&mut self, url: &Url) -> Result<RenderedPage, RenderError> {
        let started = Instant::now();
        let mut result = self.render_in_tab(url).await;

        if matches!(result, Err(RenderError::Session(_))) && self.reconnect().await {
            result = self.render_in_tab(url).await;
        }

        ::log::debug!(
            "Rendered {} in {:.2} seconds",
            url,
            started.elapsed().as_secs_f64()
        );
        result
    }

    async fn shutdown(self: Box<Self>) {
        let session = *self;
        if let Err(e) = session.client.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        } else {
            ::log::info!("Browser session closed");
        }
    }
}

impl WebDriverSession {
    async fn render_in_tab(&mut self, url: &Url) -> Result<RenderedPage, RenderError> {
        let mut tab = self.open_tab(url).await?;
        let result = self.capture(url, &mut tab).await;
        self.close_tab(&mut tab).await;
        result
    }

    async fn open_tab(&self, url: &Url) -> Result<Tab, RenderError> {
        let window = self
            .client
            .new_window(true)
            .await
            .map_err(|e| navigation_error(e, url))?;
        self.client
            .switch_to_window(window.handle.clone())
            .await
            .map_err(|e| navigation_error(e, url))?;

        Ok(Tab {
            handle: window.handle,
            closed: false,
        })
    }

    async fn capture(&self, url: &Url, tab: &mut Tab) -> Result<RenderedPage, RenderError> {
        let timeout = self.launcher.timeouts.navigation;
        match tokio::time::timeout(timeout, self.navigate_and_settle(url)).await {
            Ok(result) => result?,
            Err(_) => {
                ::log::error!("Timeout rendering: {}", url);
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    secs: timeout.as_secs(),
                });
            }
        }

        self.wait_for_table(url).await;

        let html = self
            .client
            .source()
            .await
            .map_err(|e| navigation_error(e, url))?;
        let title = self.client.title().await.unwrap_or_default();
        let final_url = self
            .client
            .current_url()
            .await
            .unwrap_or_else(|_| url.clone());

        self.close_tab(tab).await;

        Ok(RenderedPage {
            url: final_url,
            html,
            title,
        })
    }

    async fn navigate_and_settle(&self, url: &Url) -> Result<(), RenderError> {
        self.client
            .goto(url.as_str())
            .await
            .map_err(|e| navigation_error(e, url))?;

        let quiescence = self.launcher.timeouts.quiescence;
        let mut last_count = None;
        let mut stable_since = Instant::now();

        loop {
            let probe = self
                .client
                .execute(SETTLE_PROBE, Vec::new())
                .await
                .map_err(|e| navigation_error(e, url))?;
            let (ready, count) = parse_probe(&probe);

            if !ready || last_count != Some(count) {
                last_count = Some(count);
                stable_since = Instant::now();
            } else if stable_since.elapsed() >= quiescence {
                ::log::trace!("{} settled with {} resources", url, count);
                return Ok(());
            }

            tokio::time::sleep(SETTLE_POLL).await;
        }
    }

    /// Gives late tables a chance to appear; their absence is not an error
    async fn wait_for_table(&self, url: &Url) {
        let found = self
            .client
            .wait()
            .at_most(self.launcher.timeouts.table_wait)
            .for_element(Locator::Css(&self.launcher.table_selector))
            .await;
        if found.is_err() {
            ::log::debug!("No table appeared on {}", url);
        }
    }

    /// Closes the tab and returns to the base window. Safe to call twice.
    async fn close_tab(&self, tab: &mut Tab) {
        if tab.closed {
            return;
        }
        tab.closed = true;

        if let Err(e) = self.client.switch_to_window(tab.handle.clone()).await {
            ::log::trace!("Tab already gone: {}", e);
        } else if let Err(e) = self.client.close_window().await {
            ::log::warn!("Failed to close tab: {}", e);
        }
        if let Err(e) = self.client.switch_to_window(self.base_window.clone()).await {
            ::log::warn!("Failed to return to base window: {}", e);
        }
    }

    /// Attempts to replace a lost session with a new one of the same identity
    async fn reconnect(&mut self) -> bool {
        ::log::warn!("Attempting to reconnect WebDriver session");
        let launcher = &self.launcher;
        let connecting = connect(
            &launcher.webdriver_url,
            &self.capabilities,
            launcher.viewport,
            launcher.timeouts.navigation,
        );
        let client = match connecting.await {
            Ok(client) => client,
            Err(e) => {
                ::log::error!("Failed to reconnect to WebDriver: {}", e);
                return false;
            }
        };
        match client.window().await {
            Ok(base_window) => {
                let old = std::mem::replace(&mut self.client, client);
                let _ = old.close().await;
                self.base_window = base_window;
                ::log::info!("Successfully reconnected to WebDriver");
                true
            }
            Err(e) => {
                ::log::error!("Reconnected session has no window: {}", e);
                let _ = client.close().await;
                false
            }
        }
    }
}

fn parse_probe(probe: &Value) -> (bool, u64) {
    let ready = probe.get(0).and_then(Value::as_str) == Some("complete");
    let count = probe.get(1).and_then(Value::as_u64).unwrap_or(0);
    (ready, count)
}

/// Maps a WebDriver command failure onto a render error
fn navigation_error(error: fantoccini::error::CmdError, url: &Url) -> RenderError {
    let message = error.to_string();
    if message.contains("Unable to find session") || message.contains("invalid session id") {
        ::log::warn!("Lost session while rendering {}", url);
        RenderError::Session(message)
    } else {
        ::log::error!("Failed to render {}: {}", url, message);
        RenderError::Navigation {
            url: url.to_string(),
            message,
        }
    }
}
