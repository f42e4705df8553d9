//! Post, record and author data structures.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Format of the `datetime` attribute on a post's time element.
pub const SOURCE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Format used when presenting publish times in the export.
pub const DISPLAY_TIME_FORMAT: &str = "%Y年%m月%d日 %H:%M:%S";

/// Parse a post timestamp such as `2024-03-05T10:15:30.000000Z`.
///
/// The fractional seconds are mandatory and the value must not be padded.
pub fn parse_published_at(raw: &str) -> Result<NaiveDateTime> {
    // `%.f` alone also matches an absent fraction, and chrono skips leading
    // whitespace before numeric fields.
    if raw.starts_with(char::is_whitespace) || !has_fraction(raw) {
        return Err(AppError::timestamp(
            raw,
            "expected YYYY-MM-DDTHH:MM:SS.ffffffZ",
        ));
    }
    NaiveDateTime::parse_from_str(raw, SOURCE_TIME_FORMAT)
        .map_err(|e| AppError::timestamp(raw, e))
}

/// `true` when `raw` ends in `.<digits>Z`.
fn has_fraction(raw: &str) -> bool {
    raw.strip_suffix('Z')
        .and_then(|rest| rest.rsplit_once('.'))
        .is_some_and(|(_, digits)| {
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Author fields resolved from a post block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name (may be empty when the block has no author container)
    pub display_name: String,

    /// `@handle`, when one could be resolved
    pub handle: Option<String>,

    /// Profile URL derived from the handle
    pub profile_url: Option<String>,
}

impl Author {
    /// `"<display name> <@handle>"`, used for the export and image folders.
    pub fn label(&self) -> String {
        match &self.handle {
            Some(handle) => format!("{} {}", self.display_name, handle).trim().to_string(),
            None => self.display_name.trim().to_string(),
        }
    }
}

/// One post as parsed from a rendered block, before image expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Canonical permalink; identity key for deduplication
    pub permalink: String,
    pub published_at: NaiveDateTime,
    pub body_text: String,
    pub author: Author,
    /// Photo sources in document order, video thumbnails excluded
    pub image_urls: Vec<String>,
}

impl ContentItem {
    /// Expand into one record per image, or a single image-less record.
    pub fn into_records(self, task_label: &str) -> Vec<ContentRecord> {
        let base = ContentRecord {
            source_task_label: task_label.to_string(),
            published_at: self.published_at,
            author_display_name: self.author.display_name.clone(),
            author_handle: self.author.handle.clone(),
            author_profile_url: self.author.profile_url.clone(),
            content_url: self.permalink,
            body_text: self.body_text,
            image_remote_url: None,
            image_local_path: None,
        };

        if self.image_urls.is_empty() {
            return vec![base];
        }

        self.image_urls
            .into_iter()
            .map(|url| ContentRecord {
                image_remote_url: Some(url),
                ..base.clone()
            })
            .collect()
    }
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Label of the pipeline that produced the record (`Task-N`)
    pub source_task_label: String,
    pub published_at: NaiveDateTime,
    pub author_display_name: String,
    pub author_handle: Option<String>,
    pub author_profile_url: Option<String>,
    /// Post permalink
    pub content_url: String,
    /// Body text, paragraphs separated by `\n`
    pub body_text: String,
    pub image_remote_url: Option<String>,
    /// Intended download destination; the file may be absent if the download failed
    pub image_local_path: Option<PathBuf>,
}

impl ContentRecord {
    /// Publish time formatted for display.
    pub fn published_display(&self) -> String {
        self.published_at.format(DISPLAY_TIME_FORMAT).to_string()
    }

    /// Combined display name and handle.
    pub fn author_label(&self) -> String {
        Author {
            display_name: self.author_display_name.clone(),
            handle: self.author_handle.clone(),
            profile_url: None,
        }
        .label()
    }

    /// True when a local path was recorded and the file exists on disk.
    pub fn image_downloaded(&self) -> bool {
        self.image_local_path
            .as_ref()
            .is_some_and(|path| path.is_file())
    }
}

/// A distinct author seen during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub display_name: String,
    pub profile_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(images: &[&str]) -> ContentItem {
        ContentItem {
            permalink: "https://x.com/janedoe/status/1".to_string(),
            published_at: parse_published_at("2024-03-05T10:15:30.000000Z").unwrap(),
            body_text: "line one\nline two".to_string(),
            author: Author {
                display_name: "Jane Doe".to_string(),
                handle: Some("@janedoe".to_string()),
                profile_url: Some("https://x.com/janedoe".to_string()),
            },
            image_urls: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_display_time_format() {
        let item = sample_item(&[]);
        let records = item.into_records("Task-1");
        assert_eq!(records[0].published_display(), "2024年03月05日 10:15:30");
    }

    #[test]
    fn test_millisecond_precision_accepted() {
        let parsed = parse_published_at("2023-11-20T08:01:02.123Z").unwrap();
        assert_eq!(
            parsed.format(DISPLAY_TIME_FORMAT).to_string(),
            "2023年11月20日 08:01:02"
        );
    }

    #[test]
    fn test_malformed_timestamp_is_error() {
        assert!(matches!(
            parse_published_at("05/03/2024 10:15"),
            Err(AppError::Timestamp { .. })
        ));
        assert!(parse_published_at("").is_err());
    }

    #[test]
    fn test_timestamp_without_fraction_is_error() {
        assert!(matches!(
            parse_published_at("2024-03-05T10:15:30Z"),
            Err(AppError::Timestamp { .. })
        ));
        assert!(matches!(
            parse_published_at("2024-03-05T10:15:30.Z"),
            Err(AppError::Timestamp { .. })
        ));
    }

    #[test]
    fn test_padded_timestamp_is_error() {
        assert!(matches!(
            parse_published_at(" 2024-03-05T10:15:30.000Z "),
            Err(AppError::Timestamp { .. })
        ));
        assert!(matches!(
            parse_published_at(" 2024-03-05T10:15:30.000Z"),
            Err(AppError::Timestamp { .. })
        ));
        assert!(matches!(
            parse_published_at("2024-03-05T10:15:30.000Z\n"),
            Err(AppError::Timestamp { .. })
        ));
    }

    #[test]
    fn test_no_images_expands_to_one_record() {
        let records = sample_item(&[]).into_records("Task-2");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_remote_url, None);
        assert_eq!(records[0].image_local_path, None);
        assert_eq!(records[0].source_task_label, "Task-2");
    }

    #[test]
    fn test_images_expand_one_record_each() {
        let records = sample_item(&[
            "https://pbs.twimg.com/media/A.jpg?name=small",
            "https://pbs.twimg.com/media/B.jpg?name=small",
            "https://pbs.twimg.com/media/C.jpg?name=small",
        ])
        .into_records("Task-1");

        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.content_url, "https://x.com/janedoe/status/1");
            assert_eq!(record.body_text, "line one\nline two");
            assert_eq!(record.author_handle.as_deref(), Some("@janedoe"));
        }
        assert_eq!(
            records[2].image_remote_url.as_deref(),
            Some("https://pbs.twimg.com/media/C.jpg?name=small")
        );
    }

    #[test]
    fn test_author_label() {
        let author = Author {
            display_name: "Jane Doe".to_string(),
            handle: Some("@janedoe".to_string()),
            profile_url: None,
        };
        assert_eq!(author.label(), "Jane Doe @janedoe");
        assert_eq!(Author::default().label(), "");
    }
}
