// src/pipeline/harvest.rs

//! Whole-run entry point: targets in, collected records out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::browser::{ChromiumSession, RenderSession};
use crate::error::Result;
use crate::models::{Config, load_targets};
use crate::pipeline::{ConcurrentCollector, PipelineContext, TargetOrchestrator};
use crate::services::{HttpImageTransport, ImageFetcher, PageExtractor};
use crate::storage::{ExportSummary, ResultExporter, WorkbookExporter};
use crate::utils::fs::stamped_path;

/// File name stem of the results workbook.
pub const RESULTS_STEM: &str = "twitter_scrape_results";

/// How the scraping phase ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub targets: usize,
    /// The run was cut short by Ctrl-C
    pub interrupted: bool,
}

/// Scrape every target into `collector`.
///
/// A missing or empty targets file is logged and yields an empty run. A
/// browser that fails to launch is returned as an error. Ctrl-C abandons the
/// in-flight pipelines; whatever they collected stays in `collector`.
pub async fn run_harvest(config: &Config, collector: &ConcurrentCollector) -> Result<HarvestOutcome> {
    let targets = match load_targets(&config.paths.targets_file) {
        Ok(targets) => targets,
        Err(e) => {
            log::error!("{e}");
            return Ok(HarvestOutcome::default());
        }
    };
    log::info!("Loaded {} target URLs", targets.len());

    let extractor = Arc::new(PageExtractor::new(&config.site)?);
    let transport = Arc::new(HttpImageTransport::new(&config.images, config.proxy())?);
    let fetcher = Arc::new(ImageFetcher::new(
        &config.paths.image_dir,
        config.images.quality_suffix.as_str(),
        transport,
    ));

    let session = Arc::new(ChromiumSession::launch(config).await?);

    let orchestrator = TargetOrchestrator::new(PipelineContext {
        session: Arc::clone(&session) as Arc<dyn RenderSession>,
        collector: collector.clone(),
        fetcher,
        extractor,
        scroll: config.scroll.clone(),
        cookies_file: PathBuf::from(&config.paths.cookies_file),
        image_concurrency: config.images.max_concurrent,
    });

    let interrupted = tokio::select! {
        summary = orchestrator.run(&targets) => {
            if summary.crashed > 0 {
                log::warn!("{} of {} pipelines crashed", summary.crashed, summary.launched);
            }
            false
        }
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted by user; abandoning running pipelines");
            true
        }
    };

    // Cancelled pipelines release their handles as they unwind.
    drop(orchestrator);
    tokio::task::yield_now().await;

    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(e) = session.close().await {
                log::warn!("Failed to close browser cleanly: {e}");
            }
        }
        Err(_) => log::warn!("Browser still in use at shutdown; it will be killed on exit"),
    }

    Ok(HarvestOutcome {
        targets: targets.len(),
        interrupted,
    })
}

/// Write whatever `collector` holds to `<results_dir>/twitter_scrape_results_<timestamp>.xlsx`.
///
/// The directory is created if missing; an empty collector still yields a
/// workbook with both header rows.
pub async fn export_results(
    collector: &ConcurrentCollector,
    results_dir: &Path,
    timestamp: &str,
) -> Result<ExportSummary> {
    let snapshot = collector.snapshot().await;
    let path = stamped_path(results_dir, RESULTS_STEM, timestamp, "xlsx");
    WorkbookExporter::new()
        .export(&snapshot.records, &snapshot.authors, &path)
        .await
}
