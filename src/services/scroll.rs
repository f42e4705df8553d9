// src/services/scroll.rs

//! Progressive reveal loop for one target page.
//!
//! Each pass scrolls to the bottom, waits for content, then walks a snapshot
//! of the visible blocks through the extractor and the per-target dedup set.
//! The loop stalls when no content appears, when a pass after the first
//! yields nothing new, or when the pass cap is reached.

use std::sync::Arc;

use async_trait::async_trait;

use crate::browser::{PageHandle, WaitOutcome};
use crate::error::Result;
use crate::models::{ContentItem, ScrollConfig};
use crate::services::{DedupSet, Extraction, PageExtractor, SkipReason};

/// Receives every newly accepted post, in snapshot order.
#[async_trait]
pub trait PostSink: Send + Sync {
    async fn accept(&self, item: ContentItem);
}

/// Why the reveal loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallReason {
    /// No content block became visible within the wait timeout
    NoContent,
    /// A pass after the first accepted no new posts
    NoNewItems,
    /// The pass cap was reached
    PassLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealState {
    Scrolling,
    WaitingForContent,
    Extracting,
    Stalled(StallReason),
}

/// Totals for one target's reveal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSummary {
    /// Passes that reached extraction
    pub passes: usize,
    /// Posts accepted across all passes
    pub accepted: usize,
    pub stall: StallReason,
}

/// Drives the reveal loop for one target.
pub struct ScrollDriver {
    label: String,
    target_url: String,
    extractor: Arc<PageExtractor>,
    settings: ScrollConfig,
}

impl ScrollDriver {
    pub fn new(
        label: impl Into<String>,
        target_url: impl Into<String>,
        extractor: Arc<PageExtractor>,
        settings: ScrollConfig,
    ) -> Self {
        Self {
            label: label.into(),
            target_url: target_url.into(),
            extractor,
            settings,
        }
    }

    /// Run passes until the loop stalls.
    ///
    /// Only rendering-surface transport failures are returned as errors;
    /// posts already handed to `sink` stay delivered.
    pub async fn run(&self, page: &dyn PageHandle, sink: &dyn PostSink) -> Result<RevealSummary> {
        let label = &self.label;
        let mut dedup = DedupSet::new();
        let mut state = RevealState::Scrolling;
        let mut pass = 0;
        let mut passes = 0;
        let mut accepted = 0;

        loop {
            state = match state {
                RevealState::Scrolling => {
                    if pass >= self.settings.max_passes {
                        log::info!("{label} -> Reached the cap of {pass} passes. Stopping.");
                        RevealState::Stalled(StallReason::PassLimit)
                    } else {
                        log::info!(
                            "{label} -> Attempting to scroll and load more content in pass {pass}..."
                        );
                        page.scroll_to_bottom().await?;
                        tokio::time::sleep(self.settings.settle_delay()).await;
                        RevealState::WaitingForContent
                    }
                }
                RevealState::WaitingForContent => {
                    match page.wait_for_content(self.settings.content_timeout()).await? {
                        WaitOutcome::ContentAppeared => RevealState::Extracting,
                        WaitOutcome::NoContent => {
                            log::info!(
                                "{label} -> No content became visible after scrolling in pass {pass}. Stopping."
                            );
                            RevealState::Stalled(StallReason::NoContent)
                        }
                    }
                }
                RevealState::Extracting => {
                    let (blocks, new_items) = self.extract_pass(page, pass, &mut dedup, sink).await?;
                    passes += 1;
                    accepted += new_items;

                    if blocks == 0 {
                        log::info!("{label} -> No content blocks found in pass {pass}. Stopping.");
                        RevealState::Stalled(StallReason::NoContent)
                    } else if new_items == 0 && pass > 0 {
                        log::info!(
                            "{label} -> No new unique posts found after scrolling in pass {pass}. Stopping."
                        );
                        RevealState::Stalled(StallReason::NoNewItems)
                    } else {
                        pass += 1;
                        RevealState::Scrolling
                    }
                }
                RevealState::Stalled(stall) => {
                    return Ok(RevealSummary {
                        passes,
                        accepted,
                        stall,
                    });
                }
            };
        }
    }

    /// Walk one snapshot of blocks; returns `(block count, newly accepted)`.
    async fn extract_pass(
        &self,
        page: &dyn PageHandle,
        pass: usize,
        dedup: &mut DedupSet,
        sink: &dyn PostSink,
    ) -> Result<(usize, usize)> {
        let label = &self.label;
        let count = page.block_count().await?;
        let mut new_items = 0;

        for index in 0..count {
            let position = index + 1;
            let markup = match page.block_markup(index).await {
                Ok(markup) => markup,
                Err(e) => {
                    log::warn!(
                        "{label} -> Could not read block {position} in pass {pass}: {e}. Skipping this block."
                    );
                    continue;
                }
            };

            let item = match self.extractor.extract(&markup, &self.target_url) {
                Ok(Extraction::Item(item)) => item,
                Ok(Extraction::Skipped(SkipReason::Advertisement)) => {
                    log::info!("{label} -> Skipping advertisement in pass {pass}, block {position}.");
                    continue;
                }
                Ok(Extraction::Skipped(reason)) => {
                    log::info!("{label} -> Skipping block {position} in pass {pass}: {reason}.");
                    continue;
                }
                Err(e) => {
                    log::error!("{label} -> Error processing block {position} in pass {pass}: {e}");
                    continue;
                }
            };

            if !dedup.insert(&item.permalink) {
                log::debug!("{label} -> Already processed {}", item.permalink);
                continue;
            }
            new_items += 1;

            log::info!("{label} -> {}", "=".repeat(30));
            log::info!("{label} -> Pass {pass}, processing post {position}/{count}.");
            log::info!("{label} -> Published: {}", item.published_at);
            log::info!("{label} -> Author: {}", item.author.label());
            log::info!(
                "{label} -> Author Profile: {}",
                item.author.profile_url.as_deref().unwrap_or("")
            );
            log::info!("{label} -> Post URL: {}", item.permalink);
            log::info!("{label} -> Content: {}", item.body_text);
            log::info!("{label} -> Images: {:?}", item.image_urls);

            sink.accept(item).await;
        }

        Ok((count, new_items))
    }
}
