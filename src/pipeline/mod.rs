//! Pipeline entry points for a scraping run.
//!
//! - `run_harvest`: Scrape every target into the shared collector
//! - `export_results`: Write the collected rows to the results workbook
//! - `TargetOrchestrator`: Launch and join one pipeline per target
//! - `scrape_target`: The per-target pipeline

pub mod collector;
pub mod harvest;
pub mod orchestrate;
pub mod scrape;

pub use collector::{CollectedSnapshot, ConcurrentCollector};
pub use harvest::{HarvestOutcome, RESULTS_STEM, export_results, run_harvest};
pub use orchestrate::{OrchestrationSummary, TargetOrchestrator, task_label};
pub use scrape::{PipelineContext, scrape_target};
