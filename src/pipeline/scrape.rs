// src/pipeline/scrape.rs

//! Per-target pipeline: open the profile, run the reveal loop, and feed
//! every accepted post into the shared collector.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::browser::RenderSession;
use crate::models::{ContentItem, ContentRecord, ScrollConfig, SessionCookie};
use crate::pipeline::ConcurrentCollector;
use crate::services::{ImageFetcher, PageExtractor, PostSink, ScrollDriver};

/// Everything a pipeline shares with its siblings.
pub struct PipelineContext {
    pub session: Arc<dyn RenderSession>,
    pub collector: ConcurrentCollector,
    pub fetcher: Arc<ImageFetcher>,
    pub extractor: Arc<PageExtractor>,
    pub scroll: ScrollConfig,
    pub cookies_file: PathBuf,
    /// Simultaneous image downloads per post
    pub image_concurrency: usize,
}

/// Scrape one target URL.
///
/// Every failure is logged against `label` and ends only this pipeline;
/// records already collected are kept.
pub async fn scrape_target(ctx: Arc<PipelineContext>, label: String, url: String) {
    log::info!("{label} -> Starting scrape of {url}");

    let cookies = match SessionCookie::load_all(&ctx.cookies_file) {
        Ok(cookies) => cookies,
        Err(e) => {
            log::error!("{label} -> {e}");
            return;
        }
    };
    log::info!("{label} -> Loaded {} cookies", cookies.len());

    let page = match ctx.session.open(&url, &cookies).await {
        Ok(page) => page,
        Err(e) => {
            log::error!("{label} -> {e}");
            return;
        }
    };
    log::info!("{label} -> Navigated to {url}");

    let sink = CollectorSink {
        label: &label,
        ctx: &ctx,
    };
    let driver = ScrollDriver::new(
        label.as_str(),
        url.as_str(),
        Arc::clone(&ctx.extractor),
        ctx.scroll.clone(),
    );

    match driver.run(page.as_ref(), &sink).await {
        Ok(summary) => log::info!(
            "{label} -> Finished {url}: {} posts over {} passes ({:?})",
            summary.accepted,
            summary.passes,
            summary.stall
        ),
        Err(e) => log::error!("{label} -> Reveal loop aborted for {url}: {e}"),
    }

    match page.close().await {
        Ok(()) => log::info!("{label} -> Page closed for {url}"),
        Err(e) => log::warn!("{label} -> Failed to close page for {url}: {e}"),
    }
}

/// Registers authors, downloads images and appends records for accepted posts.
struct CollectorSink<'a> {
    label: &'a str,
    ctx: &'a PipelineContext,
}

#[async_trait]
impl PostSink for CollectorSink<'_> {
    async fn accept(&self, item: ContentItem) {
        let ctx = self.ctx;

        if let Some(profile_url) = item.author.profile_url.as_deref() {
            let name = &item.author.display_name;
            if !name.is_empty() && !profile_url.is_empty() {
                ctx.collector.register_author_if_absent(name, profile_url).await;
            }
        }

        let author = item.author.label();
        let records = item.into_records(self.label);
        let mut materialized = stream::iter(records)
            .map(|record| self.materialize(record, &author))
            .buffered(ctx.image_concurrency.max(1));

        // Each record lands as soon as its image settles, so an aborted
        // pipeline keeps the ones already on disk.
        while let Some(record) = materialized.next().await {
            ctx.collector.append(record).await;
        }
    }
}

impl CollectorSink<'_> {
    /// Download the record's image, if any, and note where it was written.
    async fn materialize(&self, mut record: ContentRecord, author: &str) -> ContentRecord {
        if let Some(remote) = record.image_remote_url.as_deref() {
            let outcome = self.ctx.fetcher.fetch(self.label, remote, author).await;
            record.image_local_path = Some(outcome.local_path);
        }
        record
    }
}
