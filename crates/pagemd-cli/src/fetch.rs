//! Rendered page fetch through a headless Chrome/Chromium.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, trace, warn};
use url::Url;

/// Mobile user agent sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows Phone 10.0; Android 4.2.1; Microsoft; Lumia 640 XL LTE) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/42.0.2311.135 Mobile Safari/537.36 Edge/12.10166";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_READY_TIMEOUT: Duration = Duration::from_secs(5);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to launch browser: {0}. Ensure Chrome/Chromium is installed or set CHROMIUM_PATH.")]
    Launch(String),

    #[error("Error while fetching page {url}: {source}. Ensure Chrome/Chromium is installed.")]
    Navigation {
        url: String,
        #[source]
        source: CdpError,
    },

    #[error("Failed to read page content: {0}")]
    Content(#[source] CdpError),
}

/// Browser settings, built from the command line
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Extra time given to scripts after navigation
    pub wait: Duration,
    pub headless: bool,
    pub disable_web_security: bool,
}

/// Loads a page in a fresh browser and returns the rendered HTML
pub struct BrowserFetcher {
    options: FetchOptions,
}

impl BrowserFetcher {
    pub fn new(options: FetchOptions) -> Self {
        Self { options }
    }

    /// Launch a browser, load `url`, and return `document.documentElement.outerHTML`.
    ///
    /// The browser is closed whether or not loading succeeds.
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    trace!("browser handler error: {err}");
                }
            }
        });

        let result = self.load(&browser, url).await;

        if let Err(err) = browser.close().await {
            debug!("failed to close browser: {err}");
        }
        if let Err(err) = browser.wait().await {
            debug!("failed to wait for browser exit: {err}");
        }
        handler_task.abort();

        result
    }

    fn browser_config(&self) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(NAVIGATION_TIMEOUT)
            .window_size(1920, 1080)
            .arg(format!("--user-agent={USER_AGENT}"))
            .arg("--disable-dev-shm-usage")
            .arg("--disable-features=VizDisplayCompositor");

        if !self.options.headless {
            builder = builder.with_head();
        }
        if self.options.disable_web_security {
            builder = builder.arg("--disable-web-security");
        }
        if let Ok(path) = std::env::var("CHROMIUM_PATH") {
            debug!("using browser from CHROMIUM_PATH: {path}");
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(FetchError::Launch)
    }

    async fn load(&self, browser: &Browser, url: &Url) -> Result<String, FetchError> {
        let navigation = |source| FetchError::Navigation {
            url: url.to_string(),
            source,
        };

        let page = browser.new_page("about:blank").await.map_err(navigation)?;
        page.goto(url.as_str()).await.map_err(navigation)?;
        page.wait_for_navigation().await.map_err(navigation)?;

        if !self.options.wait.is_zero() {
            sleep(self.options.wait).await;
        }

        let ready_timeout = self.options.wait.max(MIN_READY_TIMEOUT);
        if timeout(ready_timeout, wait_until_complete(&page)).await.is_err() {
            warn!("Page load timeout, continuing with partial content");
        }

        let html = page.content().await.map_err(FetchError::Content)?;
        debug!(bytes = html.len(), "fetched {url}");
        Ok(html)
    }
}

/// Poll `document.readyState` until the page reports `complete`
async fn wait_until_complete(page: &Page) {
    let start = Instant::now();
    loop {
        let state = match page.evaluate("document.readyState").await {
            Ok(result) => result.into_value::<String>().ok(),
            Err(err) => {
                trace!("readyState check failed: {err}");
                None
            }
        };
        if state.as_deref() == Some("complete") {
            debug!("page ready after {:?}", start.elapsed());
            return;
        }
        sleep(READY_POLL_INTERVAL).await;
    }
}
