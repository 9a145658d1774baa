use crate::browser::config::LaunchOptions;
use crate::error::{Result, ScrapeError};
use headless_chrome::{Browser, Tab};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Browser session that manages a Chrome/Chromium instance.
///
/// The session is the only long-lived shared resource in the process:
/// acquired once at service start, released at shutdown. Each scrape
/// request opens its own [`Page`].
pub struct BrowserSession {
    browser: Browser,
    navigation_timeout: Duration,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Container-friendly flags; the target page is heavy on images
        launch_opts.args.push(OsStr::new("--disable-dev-shm-usage"));
        launch_opts.args.push(OsStr::new("--disable-gpu"));
        launch_opts.args.push(OsStr::new("--no-first-run"));

        // Keep the browser alive between requests (default idle timeout is 30 seconds)
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        let browser = Browser::new(launch_opts).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        log::info!("browser launched");

        Ok(Self { browser, navigation_timeout: options.navigation_timeout })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Open a fresh page (tab) for one scrape request.
    ///
    /// Image responses observed on the network are recorded from the
    /// moment the page is opened, so transiently-rendered assets are
    /// captured even if they never survive into the final DOM.
    pub fn open_page(&self) -> Result<Page> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(self.navigation_timeout);

        let network_images: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = network_images.clone();

        tab.register_response_handling(
            "image-capture",
            Box::new(move |params, _fetch_body| {
                let response = &params.response;
                let is_cdn = response.url.contains("image.idus.com");
                let is_image = response.mime_type.starts_with("image/") && response.url.contains("idus");
                if (is_cdn || is_image) && response.url.starts_with("http") {
                    if let Ok(mut urls) = sink.lock() {
                        urls.push(response.url.clone());
                    }
                }
            }),
        )
        .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to register response handler: {}", e)))?;

        Ok(Page { tab, network_images })
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close the browser.
    ///
    /// Each tab close is guarded independently so one failure doesn't
    /// block the rest of the shutdown.
    pub fn close(&self) {
        let tabs = match self.browser.get_tabs().lock() {
            Ok(tabs) => tabs.clone(),
            Err(e) => {
                log::warn!("could not enumerate tabs at shutdown: {}", e);
                return;
            }
        };
        for tab in tabs {
            if let Err(e) = tab.close(false) {
                log::debug!("tab close failed (ignored): {}", e);
            }
        }
        log::info!("browser closed");
    }
}

/// One rendered page bound to a single scrape request.
pub struct Page {
    tab: Arc<Tab>,
    network_images: Arc<Mutex<Vec<String>>>,
}

impl Page {
    /// Navigate to a URL and wait for the document to load.
    /// A timeout here is fatal to the request.
    pub fn goto(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| ScrapeError::NavigationFailed(format!("Navigation timeout: {}", e)))?;
        Ok(())
    }

    /// Evaluate a JavaScript expression and return its value, if any
    pub fn eval(&self, script: &str) -> Result<Option<serde_json::Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| ScrapeError::EvaluationFailed(e.to_string()))?;
        Ok(result.value)
    }

    /// Evaluate a script that returns a string (or null)
    pub fn eval_string(&self, script: &str) -> Result<Option<String>> {
        match self.eval(script)? {
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    /// Evaluate a script returning `JSON.stringify(...)` output and
    /// deserialize it. A null result maps to `Ok(None)`.
    pub fn eval_json<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<Option<T>> {
        let Some(json_str) = self.eval_string(script)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_str(&json_str)
            .map_err(|e| ScrapeError::EvaluationFailed(format!("Failed to parse script result: {}", e)))?;
        Ok(Some(parsed))
    }

    /// Document title
    pub fn title(&self) -> Result<String> {
        self.tab.get_title().map_err(|e| ScrapeError::EvaluationFailed(e.to_string()))
    }

    /// Full page markup, including script-injected content
    pub fn content(&self) -> Result<String> {
        self.tab.get_content().map_err(|e| ScrapeError::EvaluationFailed(e.to_string()))
    }

    /// Click the first visible element whose text contains one of the
    /// given labels. Returns false when nothing matched, which callers
    /// treat as "feature not found", never as an error.
    pub fn click_text(&self, labels: &[&str]) -> bool {
        let labels_json = match serde_json::to_string(labels) {
            Ok(json) => json,
            Err(_) => return false,
        };
        let script = format!(
            r#"
            (() => {{
                const labels = {labels_json};
                const candidates = document.querySelectorAll('button, a, [role="tab"], [role="button"], div, span');
                for (const el of candidates) {{
                    const text = (el.innerText || '').trim();
                    if (!text) continue;
                    for (const label of labels) {{
                        if (text === label || (text.includes(label) && text.length <= label.length + 10)) {{
                            const rect = el.getBoundingClientRect();
                            if (rect.width === 0 && rect.height === 0) continue;
                            el.click();
                            return true;
                        }}
                    }}
                }}
                return false;
            }})()
            "#
        );
        matches!(self.eval(&script), Ok(Some(serde_json::Value::Bool(true))))
    }

    /// Click the first visible element matching one of the CSS selectors
    pub fn click_selector(&self, selectors: &[&str]) -> bool {
        let selectors_json = match serde_json::to_string(selectors) {
            Ok(json) => json,
            Err(_) => return false,
        };
        let script = format!(
            r#"
            (() => {{
                const selectors = {selectors_json};
                for (const sel of selectors) {{
                    let el;
                    try {{ el = document.querySelector(sel); }} catch (e) {{ continue; }}
                    if (!el) continue;
                    const rect = el.getBoundingClientRect();
                    if (rect.width === 0 && rect.height === 0) continue;
                    el.click();
                    return true;
                }}
                return false;
            }})()
            "#
        );
        matches!(self.eval(&script), Ok(Some(serde_json::Value::Bool(true))))
    }

    /// Press Escape, dismissing any open panel or sheet
    pub fn press_escape(&self) {
        if let Err(e) = self.tab.press_key("Escape") {
            log::debug!("escape press failed (ignored): {}", e);
        }
    }

    /// Fixed settle delay after an interaction that triggers an
    /// asynchronous UI update. Bounded by construction, unlike an
    /// indefinite wait-for-element on a page we don't control.
    pub fn settle(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    /// Current document scroll height
    pub fn scroll_height(&self) -> Result<u64> {
        match self.eval("document.body.scrollHeight")? {
            Some(value) => Ok(value.as_u64().unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Incrementally scroll to the bottom of the page so lazy-loaded
    /// assets materialize as they cross the viewport. Halts when the
    /// page height stabilizes across repeated checks or the step
    /// budget is exhausted.
    pub fn scroll_to_bottom(&self, step: u64, settle_ms: u64, max_steps: u32) -> Result<()> {
        let mut offset: u64 = 0;
        let mut last_height = self.scroll_height()?;
        let mut stable_checks = 0u32;

        for _ in 0..max_steps {
            self.eval(&format!("window.scrollTo(0, {})", offset))?;
            self.settle(settle_ms);
            offset += step;

            let height = self.scroll_height()?;
            if offset >= height {
                if height == last_height {
                    stable_checks += 1;
                    if stable_checks >= 2 {
                        break;
                    }
                } else {
                    stable_checks = 0;
                }
            }
            last_height = height;
        }

        self.eval("window.scrollTo(0, document.body.scrollHeight)")?;
        self.settle(settle_ms.saturating_mul(5));
        Ok(())
    }

    /// Image URLs observed on the network since the page was opened
    pub fn captured_images(&self) -> Vec<String> {
        self.network_images.lock().map(|urls| urls.clone()).unwrap_or_default()
    }

    /// Close the page, restoring the session for the next request
    pub fn close(&self) {
        let _ = self.tab.deregister_response_handling("image-capture");
        if let Err(e) = self.tab.close(true) {
            log::debug!("page close failed (ignored): {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_open_page_and_navigate() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let page = session.open_page().expect("Failed to open page");
        page.goto("about:blank").expect("Navigation failed");
        assert!(page.captured_images().is_empty());
        page.close();
    }

    #[test]
    #[ignore]
    fn test_eval_primitives() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let page = session.open_page().expect("Failed to open page");
        page.goto("about:blank").expect("Navigation failed");

        let value = page.eval("1 + 1").expect("eval failed");
        assert_eq!(value, Some(serde_json::json!(2)));

        let text = page.eval_string("JSON.stringify({a: 1})").expect("eval failed");
        assert_eq!(text, Some("{\"a\":1}".to_string()));
    }
}
