// src/browser/chromium.rs

//! Chromium-backed rendering session (Chrome DevTools Protocol).

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

use crate::browser::{PageHandle, RenderSession, WaitOutcome};
use crate::error::{AppError, Result};
use crate::models::{Config, SameSite, SessionCookie};

/// A launched Chromium instance.
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    block_selector: String,
    navigation_timeout: Duration,
    block_timeout: Duration,
    poll_interval: Duration,
}

impl ChromiumSession {
    /// Launch Chromium with the configured head mode and proxy.
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .launch_timeout(config.browser.launch_timeout())
            .request_timeout(config.browser.navigation_timeout());
        if !config.browser.headless {
            builder = builder.with_head();
        }
        if let Some(proxy) = config.proxy() {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        let browser_config = builder.build().map_err(AppError::browser)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("Browser handler event error: {}", e);
                }
            }
        });

        log::info!(
            "Browser launched ({})",
            if config.browser.headless { "headless" } else { "headed" }
        );

        Ok(Self {
            browser,
            handler_task,
            block_selector: config.site.content_block.clone(),
            navigation_timeout: config.browser.navigation_timeout(),
            block_timeout: config.scroll.block_timeout(),
            poll_interval: config.scroll.poll_interval(),
        })
    }

    /// Close the browser and stop the event handler.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        closed?;
        log::info!("Browser closed");
        Ok(())
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn open(&self, url: &str, cookies: &[SessionCookie]) -> Result<Box<dyn PageHandle>> {
        let page = self.browser.new_page("about:blank").await?;

        let params = cookies
            .iter()
            .map(cookie_param)
            .collect::<Result<Vec<_>>>();
        let applied = match params {
            Ok(params) => page.set_cookies(params).await.map(|_| ()).map_err(AppError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = applied {
            let _ = page.close().await;
            return Err(AppError::session(format!("failed to apply cookies: {e}")));
        }

        match timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                let _ = page.close().await;
                return Err(AppError::navigation(url, e));
            }
            Err(_) => {
                let _ = page.close().await;
                return Err(AppError::navigation(
                    url,
                    format!(
                        "timed out after {} seconds; check network or proxy",
                        self.navigation_timeout.as_secs()
                    ),
                ));
            }
        }

        Ok(Box::new(ChromiumPage {
            page,
            selector_js: serde_json::to_string(&self.block_selector)?,
            block_timeout: self.block_timeout,
            poll_interval: self.poll_interval,
        }))
    }
}

/// Convert a stored cookie into a CDP cookie, dropping unknown same-site values.
fn cookie_param(cookie: &SessionCookie) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone());
    if let Some(domain) = &cookie.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(path) = &cookie.path {
        builder = builder.path(path.clone());
    }
    if let Some(secure) = cookie.secure {
        builder = builder.secure(secure);
    }
    if let Some(http_only) = cookie.http_only {
        builder = builder.http_only(http_only);
    }
    if let Some(expires) = cookie.expires {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }
    match cookie.same_site() {
        Some(SameSite::Strict) => builder = builder.same_site(CookieSameSite::Strict),
        Some(SameSite::Lax) => builder = builder.same_site(CookieSameSite::Lax),
        Some(SameSite::None) => builder = builder.same_site(CookieSameSite::None),
        None => {
            if cookie.same_site.is_some() {
                log::debug!("Dropping unrecognised sameSite on cookie '{}'", cookie.name);
            }
        }
    }
    builder
        .build()
        .map_err(|e| AppError::session(format!("cookie '{}': {}", cookie.name, e)))
}

/// One Chromium tab.
struct ChromiumPage {
    page: Page,
    /// Content block selector as a JS string literal
    selector_js: String,
    block_timeout: Duration,
    poll_interval: Duration,
}

impl ChromiumPage {
    async fn first_block_visible(&self) -> Result<bool> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el) return false; \
             const r = el.getBoundingClientRect(); \
             return r.width > 0 && r.height > 0; }})()",
            sel = self.selector_js
        );
        Ok(self.page.evaluate(script).await?.into_value::<bool>()?)
    }
}

#[async_trait]
impl PageHandle for ChromiumPage {
    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn wait_for_content(&self, limit: Duration) -> Result<WaitOutcome> {
        let deadline = Instant::now() + limit;
        loop {
            if self.first_block_visible().await? {
                return Ok(WaitOutcome::ContentAppeared);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::NoContent);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn block_count(&self) -> Result<usize> {
        let script = format!("document.querySelectorAll({}).length", self.selector_js);
        Ok(self.page.evaluate(script).await?.into_value::<usize>()?)
    }

    async fn block_markup(&self, index: usize) -> Result<String> {
        let script = format!(
            "(() => {{ const el = document.querySelectorAll({sel})[{index}]; \
             if (!el) return null; \
             const r = el.getBoundingClientRect(); \
             if (r.width === 0 && r.height === 0) return null; \
             return el.innerHTML; }})()",
            sel = self.selector_js
        );
        let markup = timeout(self.block_timeout, self.page.evaluate(script))
            .await
            .map_err(|_| {
                AppError::browser(format!(
                    "block {index} not readable within {} seconds",
                    self.block_timeout.as_secs()
                ))
            })??
            .into_value::<Option<String>>()?;
        markup.ok_or_else(|| AppError::browser(format!("block {index} is not visible")))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
