//! Rendering surface abstractions.
//!
//! The reveal loop only needs a handful of page operations; they are
//! expressed as traits so the loop can be driven by a real browser
//! ([`ChromiumSession`]) or by a scripted page in tests.

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SessionCookie;

pub use chromium::ChromiumSession;

/// Result of a bounded wait for content to become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one content block is visible
    ContentAppeared,
    /// The wait timed out without any visible content
    NoContent,
}

/// One open page (tab) on a target.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Scroll to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Wait up to `timeout` for the first content block to become visible.
    ///
    /// A timeout is reported as [`WaitOutcome::NoContent`]; only transport
    /// failures are errors.
    async fn wait_for_content(&self, timeout: Duration) -> Result<WaitOutcome>;

    /// Number of content blocks currently in the document.
    async fn block_count(&self) -> Result<usize>;

    /// Inner markup of the block at `index` of the current snapshot.
    async fn block_markup(&self, index: usize) -> Result<String>;

    /// Close the page.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A browser session shared by every pipeline of a run.
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Open a new page, apply `cookies`, and navigate to `url`.
    async fn open(&self, url: &str, cookies: &[SessionCookie]) -> Result<Box<dyn PageHandle>>;
}
