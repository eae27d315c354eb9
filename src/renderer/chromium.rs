//! Chromium-backed renderer using chromiumoxide.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout, timeout_at};
use tracing::{debug, info, warn};

use super::{PageRenderer, RenderFailure};
use crate::config::BrowserSettings;
use crate::dom::ClassMarker;
use crate::error::{RenderError, ScrapeError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SNAPSHOT_GRACE: Duration = Duration::from_secs(2);
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Renders pages in a fresh browser per call, waiting for product cards to show up.
pub struct ChromiumRenderer {
    settings: BrowserSettings,
    card_marker: String,
}

impl ChromiumRenderer {
    pub fn new(settings: BrowserSettings, card_marker: &str) -> Result<Self, ScrapeError> {
        let marker = ClassMarker::new(card_marker)?;
        Ok(Self {
            settings,
            card_marker: marker.as_str().to_string(),
        })
    }

    fn timeout_error(&self) -> RenderError {
        RenderError::Timeout {
            marker: self.card_marker.clone(),
            secs: self.settings.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderFailure> {
        let deadline = Instant::now() + self.settings.timeout;

        let mut session = match timeout_at(deadline, RenderSession::launch(&self.settings)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(RenderFailure::new(e, "")),
            Err(_) => return Err(RenderFailure::new(self.timeout_error(), "")),
        };

        let captured = session.capture(url, &self.card_marker, &self.settings, deadline).await;
        let result = match captured {
            Ok(Some(html)) => Ok(html),
            Ok(None) => Err(self.timeout_error()),
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(html) => Ok(html),
            Err(error) => {
                warn!("render of {url} failed: {error}");
                let partial = session.snapshot().await;
                Err(RenderFailure::new(error, partial))
            }
        };

        session.close().await;
        result
    }
}

/// One browser process, the task driving its CDP connection, and the
/// throwaway profile directory it runs in.
///
/// `close` shuts the browser down; dropping the session without closing
/// still stops the handler task and the process is killed with the browser.
/// The profile is removed after the browser, as fields drop in order.
struct RenderSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    profile: TempDir,
}

impl RenderSession {
    async fn launch(settings: &BrowserSettings) -> Result<Self, RenderError> {
        let profile = new_profile_dir()?;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .incognito()
            .arg(format!("--user-agent={}", settings.user_agent))
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler: {e}");
                }
            }
        });
        debug!("browser launched with profile {}", profile.path().display());

        Ok(Self {
            browser,
            handler,
            page: None,
            profile,
        })
    }

    /// Navigate, settle, and wait for a visible card until `deadline`.
    ///
    /// `Ok(None)` means the deadline passed first.
    async fn capture(
        &mut self,
        url: &str,
        marker: &str,
        settings: &BrowserSettings,
        deadline: Instant,
    ) -> Result<Option<String>, RenderError> {
        let page = match timeout_at(deadline, self.browser.new_page("about:blank")).await {
            Ok(page) => page.map_err(|e| RenderError::Navigation(e.to_string()))?,
            Err(_) => return Ok(None),
        };
        self.page = Some(page.clone());

        info!("loading {url}");
        match timeout_at(deadline, page.goto(url)).await {
            Ok(loaded) => {
                loaded.map_err(|e| RenderError::Navigation(e.to_string()))?;
            }
            Err(_) => return Ok(None),
        }

        if timeout_at(deadline, sleep(settings.settle_delay)).await.is_err() {
            return Ok(None);
        }

        if timeout_at(deadline, wait_visible(&page, marker)).await.is_err() {
            return Ok(None);
        }

        match timeout_at(deadline, outer_html(&page)).await {
            Ok(html) => html.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Whatever the page currently holds; empty if nothing can be read.
    async fn snapshot(&self) -> String {
        let Some(page) = &self.page else {
            return String::new();
        };
        match timeout(SNAPSHOT_GRACE, page.content()).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                debug!("no partial markup: {e}");
                String::new()
            }
            Err(_) => String::new(),
        }
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            let _ = timeout(CLOSE_GRACE, page.close()).await;
        }
        match timeout(CLOSE_GRACE, self.browser.close()).await {
            Ok(Ok(_)) => {
                let _ = timeout(CLOSE_GRACE, self.browser.wait()).await;
            }
            Ok(Err(e)) => {
                debug!("browser close failed, killing: {e}");
                let _ = self.browser.kill().await;
            }
            Err(_) => {
                debug!("browser close timed out, killing");
                let _ = self.browser.kill().await;
            }
        }
        self.handler.abort();
        debug!("browser closed, removing profile {}", self.profile.path().display());
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn new_profile_dir() -> Result<TempDir, RenderError> {
    tempfile::Builder::new()
        .prefix("catalog-scraper-profile-")
        .tempdir()
        .map_err(|e| RenderError::Launch(format!("cannot create browser profile: {e}")))
}

/// Poll until an element with a class token containing `marker` is rendered
/// with a non-empty box and is not hidden.
///
/// Evaluation errors are retried: a client-side redirect or hydration can
/// replace the execution context mid-poll. The caller's deadline ends the wait.
async fn wait_visible(page: &Page, marker: &str) {
    let source = visibility_script(marker);
    let script = source.as_str();
    poll_until_true(move || async move {
        page.evaluate(script)
            .await
            .map_err(|e| e.to_string())?
            .into_value::<bool>()
            .map_err(|e| e.to_string())
    })
    .await;
    debug!("card marker `{marker}` is visible");
}

/// Run `check` every `POLL_INTERVAL` until it yields `Ok(true)`.
async fn poll_until_true<F, Fut, E>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    loop {
        match check().await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => debug!("visibility check failed, retrying: {e}"),
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn outer_html(page: &Page) -> Result<String, RenderError> {
    page.evaluate("document.documentElement.outerHTML")
        .await
        .map_err(|e| RenderError::Evaluation(e.to_string()))?
        .into_value()
        .map_err(|e| RenderError::Evaluation(e.to_string()))
}

fn visibility_script(marker: &str) -> String {
    // JSON string literals are valid JS string literals.
    let literal = serde_json::Value::from(marker).to_string();
    format!(
        r#"(() => {{
    const marker = {literal};
    for (const el of document.querySelectorAll("[class]")) {{
        if (!Array.from(el.classList).some(c => c.includes(marker))) continue;
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        if (rect.width > 0 && rect.height > 0 && style.visibility !== "hidden" && style.display !== "none") {{
            return true;
        }}
    }}
    return false;
}})()"#
    )
}
