// src/pipeline/orchestrate.rs

//! Runs one pipeline per target concurrently.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::pipeline::ConcurrentCollector;
use crate::pipeline::scrape::{PipelineContext, scrape_target};

/// Label for the pipeline of the `index`-th target (zero-based).
pub fn task_label(index: usize) -> String {
    format!("Task-{}", index + 1)
}

/// Tallies for one orchestrated run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestrationSummary {
    pub launched: usize,
    /// Pipelines that ended by panicking or being cancelled
    pub crashed: usize,
}

/// Fans a target list out to concurrent pipelines sharing one context.
pub struct TargetOrchestrator {
    ctx: Arc<PipelineContext>,
}

impl TargetOrchestrator {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn collector(&self) -> &ConcurrentCollector {
        &self.ctx.collector
    }

    /// Launch a pipeline for every target and wait for all of them.
    ///
    /// Pipelines never fail each other: errors are logged inside each one,
    /// and a panicking pipeline is logged here and counted. Dropping the
    /// returned future aborts every pipeline still running.
    pub async fn run(&self, targets: &[String]) -> OrchestrationSummary {
        let mut set = JoinSet::new();
        for (index, url) in targets.iter().enumerate() {
            let label = task_label(index);
            log::info!("{label} -> Queued {url}");
            set.spawn(scrape_target(Arc::clone(&self.ctx), label, url.clone()));
        }

        let mut summary = OrchestrationSummary {
            launched: targets.len(),
            crashed: 0,
        };
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                log::error!("Pipeline task failed: {e}");
                summary.crashed += 1;
            }
        }

        log::info!("All {} pipelines finished", summary.launched);
        summary
    }
}
