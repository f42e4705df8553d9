//! Excel workbook exporter.

use std::path::Path;

use async_trait::async_trait;
use rust_xlsxwriter::{Format, Url, Workbook, Worksheet};
use tokio::io::AsyncWriteExt;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::models::{AuthorEntry, ContentRecord};
use crate::storage::{ExportSummary, ResultExporter};
use crate::utils::file_url;

pub const RECORD_SHEET: &str = "推文图片信息";
pub const AUTHOR_SHEET: &str = "唯一发布者信息";

/// Shown in the local-path column when the image file is absent.
pub const MISSING_IMAGE: &str = "文件未下载或不存在";

const MAX_COLUMN_WIDTH: f64 = 100.0;
/// Excel's per-cell text limit.
const MAX_CELL_CHARS: usize = 32_767;

/// Columns of the record sheet, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordColumn {
    TaskLabel,
    PublishedAt,
    Author,
    AuthorProfile,
    Permalink,
    Body,
    RemoteImage,
    LocalImage,
}

impl RecordColumn {
    pub const ALL: [RecordColumn; 8] = [
        RecordColumn::TaskLabel,
        RecordColumn::PublishedAt,
        RecordColumn::Author,
        RecordColumn::AuthorProfile,
        RecordColumn::Permalink,
        RecordColumn::Body,
        RecordColumn::RemoteImage,
        RecordColumn::LocalImage,
    ];

    pub fn header(self) -> &'static str {
        match self {
            RecordColumn::TaskLabel => "任务名称",
            RecordColumn::PublishedAt => "发布时间",
            RecordColumn::Author => "发布者",
            RecordColumn::AuthorProfile => "发布者主页链接",
            RecordColumn::Permalink => "推文地址",
            RecordColumn::Body => "推文内容",
            RecordColumn::RemoteImage => "图片网络地址",
            RecordColumn::LocalImage => "本地图片路径",
        }
    }

    /// Cell content of this column for `record`.
    pub fn cell(self, record: &ContentRecord) -> Cell {
        match self {
            RecordColumn::TaskLabel => Cell::Text(record.source_task_label.clone()),
            RecordColumn::PublishedAt => Cell::Text(record.published_display()),
            RecordColumn::Author => Cell::Text(record.author_label()),
            RecordColumn::AuthorProfile => Cell::link_or_empty(record.author_profile_url.as_deref()),
            RecordColumn::Permalink => Cell::link_or_empty(Some(&record.content_url)),
            RecordColumn::Body => Cell::Text(record.body_text.clone()),
            RecordColumn::RemoteImage => {
                Cell::Text(record.image_remote_url.clone().unwrap_or_default())
            }
            RecordColumn::LocalImage => match &record.image_local_path {
                None => Cell::Text(String::new()),
                Some(path) if path.is_file() => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    match file_url(path) {
                        Some(url) => Cell::Link { url, text: name },
                        None => Cell::Text(name),
                    }
                }
                Some(_) => Cell::Text(MISSING_IMAGE.to_string()),
            },
        }
    }
}

/// One worksheet cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Link { url: String, text: String },
}

impl Cell {
    fn link_or_empty(url: Option<&str>) -> Self {
        match url {
            Some(url) if !url.is_empty() => Cell::Link {
                url: url.to_string(),
                text: url.to_string(),
            },
            _ => Cell::Text(String::new()),
        }
    }

    fn display(&self) -> &str {
        match self {
            Cell::Text(text) => text,
            Cell::Link { text, .. } => text,
        }
    }
}

/// `(longest display length + 2) * 1.2`, capped.
pub fn column_width<'a>(header: &str, values: impl IntoIterator<Item = &'a str>) -> f64 {
    let longest = values
        .into_iter()
        .map(|v| v.graphemes(true).count())
        .chain(std::iter::once(header.graphemes(true).count()))
        .max()
        .unwrap_or(0);
    ((longest + 2) as f64 * 1.2).min(MAX_COLUMN_WIDTH)
}

/// Writes the two-sheet results workbook.
#[derive(Debug, Clone, Default)]
pub struct WorkbookExporter;

impl WorkbookExporter {
    pub fn new() -> Self {
        Self
    }

    /// Build the workbook in memory.
    pub fn render(&self, records: &[ContentRecord], authors: &[AuthorEntry]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let rows: Vec<Vec<Cell>> = records
            .iter()
            .map(|record| RecordColumn::ALL.iter().map(|c| c.cell(record)).collect())
            .collect();
        let headers: Vec<&str> = RecordColumn::ALL.iter().map(|c| c.header()).collect();
        write_sheet(workbook.add_worksheet(), RECORD_SHEET, &headers, &rows, &header)?;

        let rows: Vec<Vec<Cell>> = authors
            .iter()
            .map(|author| {
                vec![
                    Cell::Text(author.display_name.clone()),
                    Cell::link_or_empty(Some(&author.profile_url)),
                ]
            })
            .collect();
        write_sheet(
            workbook.add_worksheet(),
            AUTHOR_SHEET,
            &["发布者名称", "发布者主页链接"],
            &rows,
            &header,
        )?;

        Ok(workbook.save_to_buffer()?)
    }
}

#[async_trait]
impl ResultExporter for WorkbookExporter {
    async fn export(
        &self,
        records: &[ContentRecord],
        authors: &[AuthorEntry],
        path: &Path,
    ) -> Result<ExportSummary> {
        let bytes = self.render(records, authors)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await?;

        let with_image = records.iter().filter(|r| r.image_local_path.is_some());
        let images_downloaded = with_image.clone().filter(|r| r.image_downloaded()).count();

        Ok(ExportSummary {
            path: path.to_path_buf(),
            record_rows: records.len(),
            author_rows: authors.len(),
            images_downloaded,
            images_missing: with_image.count() - images_downloaded,
        })
    }
}

fn write_sheet(
    sheet: &mut Worksheet,
    name: &str,
    headers: &[&str],
    rows: &[Vec<Cell>],
    header_format: &Format,
) -> Result<()> {
    sheet.set_name(name)?;

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            write_cell(sheet, row_num, col as u16, cell)?;
        }
    }

    for (col, header) in headers.iter().enumerate() {
        let width = column_width(header, rows.iter().filter_map(|r| r.get(col)).map(Cell::display));
        sheet.set_column_width(col as u16, width)?;
    }
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Text(text) if text.is_empty() => {}
        Cell::Text(text) => {
            sheet.write_string(row, col, clip(text))?;
        }
        Cell::Link { url, text } => {
            let link = Url::new(url.as_str()).set_text(clip(text));
            if let Err(e) = sheet.write_url(row, col, link) {
                log::warn!("Writing '{url}' as plain text: {e}");
                sheet.write_string(row, col, clip(text))?;
            }
        }
    }
    Ok(())
}

fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
