//! Result export.
//!
//! A run ends by handing the collected records and authors to a
//! [`ResultExporter`]. The workbook layout:
//!
//! ```text
//! results/twitter_scrape_results_<YYYYMMDDHHMMSS>.xlsx
//! ├── 推文图片信息      # one row per record
//! └── 唯一发布者信息    # one row per distinct author
//! ```

pub mod workbook;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AuthorEntry, ContentRecord};

pub use workbook::WorkbookExporter;

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub record_rows: usize,
    pub author_rows: usize,
    /// Records whose image file exists on disk
    pub images_downloaded: usize,
    /// Records with a recorded image path but no file
    pub images_missing: usize,
}

/// Trait for result export backends.
#[async_trait]
pub trait ResultExporter: Send + Sync {
    /// Write `records` and `authors` to `path`, replacing any existing file.
    async fn export(
        &self,
        records: &[ContentRecord],
        authors: &[AuthorEntry],
        path: &Path,
    ) -> Result<ExportSummary>;
}
