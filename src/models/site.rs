// src/models/site.rs

//! CSS selectors and markers describing the scraped site's post layout.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Origin, selectors and markers for one site family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Base origin prefixed to permalinks and handles
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Selector for each rendered post block on the page
    #[serde(default = "default_content_block")]
    pub content_block: String,

    /// Selector for the post's time element
    #[serde(default = "default_time")]
    pub time: String,

    /// Selector for the post body container
    #[serde(default = "default_text_container")]
    pub text_container: String,

    /// Selector for the photo container
    #[serde(default = "default_photo_container")]
    pub photo_container: String,

    /// Selector for the author name/handle container
    #[serde(default = "default_author_container")]
    pub author_container: String,

    /// Literal markup fragments that mark a promoted post
    #[serde(default = "default_ad_markers")]
    pub ad_markers: Vec<String>,

    /// Exact text of a `div` that marks a promoted post
    #[serde(default = "default_ad_label")]
    pub ad_label: String,

    /// Substring identifying video thumbnails among photo sources
    #[serde(default = "default_video_thumb_marker")]
    pub video_thumb_marker: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            content_block: default_content_block(),
            time: default_time(),
            text_container: default_text_container(),
            photo_container: default_photo_container(),
            author_container: default_author_container(),
            ad_markers: default_ad_markers(),
            ad_label: default_ad_label(),
            video_thumb_marker: default_video_thumb_marker(),
        }
    }
}

impl SiteProfile {
    /// Join a site-relative path onto the origin.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}/{}", self.origin.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Whether `url` points somewhere below this site's origin.
    pub fn owns(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/", self.origin.trim_end_matches('/')))
    }

    /// Check that every selector parses and the origin is an absolute URL.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.origin)?;
        for selector in [
            &self.content_block,
            &self.time,
            &self.text_container,
            &self.photo_container,
            &self.author_container,
        ] {
            parse_selector(selector)?;
        }
        Ok(())
    }
}

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn default_origin() -> String {
    "https://x.com".to_string()
}

fn default_content_block() -> String {
    "article".to_string()
}

fn default_time() -> String {
    "time".to_string()
}

fn default_text_container() -> String {
    r#"div[data-testid="tweetText"]"#.to_string()
}

fn default_photo_container() -> String {
    r#"div[data-testid="tweetPhoto"]"#.to_string()
}

fn default_author_container() -> String {
    r#"div[data-testid="User-Name"]"#.to_string()
}

fn default_ad_markers() -> Vec<String> {
    vec![r#"style="text-overflow: unset;">Ad</span>"#.to_string()]
}

fn default_ad_label() -> String {
    "Ad".to_string()
}

fn default_video_thumb_marker() -> String {
    "video_thumb".to_string()
}
