// src/services/extractor.rs

//! Post extraction from rendered content blocks.
//!
//! Turns the inner markup of one rendered block into a [`ContentItem`], or
//! classifies it as something to skip (promoted post, non-standard layout).

use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{Author, ContentItem, SiteProfile, parse_published_at, parse_selector};
use crate::utils::trailing_segment;

/// Why a block produced no post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Promoted post
    Advertisement,
    /// No time element (promotion, "who to follow", or another layout)
    MissingTime,
    /// Time element not wrapped in a link
    MissingPermalink,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Advertisement => "advertisement",
            SkipReason::MissingTime => {
                "no time element found (possibly not a standard post/ad/unusual content)"
            }
            SkipReason::MissingPermalink => "no permalink wraps the time element",
        };
        f.write_str(reason)
    }
}

/// Outcome of extracting one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Item(ContentItem),
    Skipped(SkipReason),
}

/// Parses rendered post blocks using the site's selectors.
pub struct PageExtractor {
    profile: SiteProfile,
    time_sel: Selector,
    text_sel: Selector,
    photo_sel: Selector,
    author_sel: Selector,
    span_sel: Selector,
    img_sel: Selector,
    div_sel: Selector,
}

impl PageExtractor {
    /// Build an extractor, compiling every selector of the profile up front.
    pub fn new(profile: &SiteProfile) -> Result<Self> {
        Ok(Self {
            profile: profile.clone(),
            time_sel: parse_selector(&profile.time)?,
            text_sel: parse_selector(&profile.text_container)?,
            photo_sel: parse_selector(&profile.photo_container)?,
            author_sel: parse_selector(&profile.author_container)?,
            span_sel: parse_selector("span")?,
            img_sel: parse_selector("img")?,
            div_sel: parse_selector("div")?,
        })
    }

    /// Extract one block.
    ///
    /// `target_url` is the page being scraped; it is only consulted when the
    /// block itself does not reveal the author's handle. A malformed
    /// timestamp is the only error; structural absences skip or leave a
    /// field empty.
    pub fn extract(&self, markup: &str, target_url: &str) -> Result<Extraction> {
        if self.profile.ad_markers.iter().any(|m| markup.contains(m.as_str())) {
            return Ok(Extraction::Skipped(SkipReason::Advertisement));
        }

        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();

        if self.has_ad_label(&root) {
            return Ok(Extraction::Skipped(SkipReason::Advertisement));
        }

        let Some(time) = root.select(&self.time_sel).next() else {
            return Ok(Extraction::Skipped(SkipReason::MissingTime));
        };

        let Some(href) = wrapping_href(&time) else {
            return Ok(Extraction::Skipped(SkipReason::MissingPermalink));
        };
        let permalink = if href.starts_with("http") {
            href.to_string()
        } else {
            self.profile.absolute(href)
        };

        let published_at = parse_published_at(time.value().attr("datetime").unwrap_or(""))?;

        Ok(Extraction::Item(ContentItem {
            permalink,
            published_at,
            body_text: self.body_text(&root),
            author: self.resolve_author(&root, target_url),
            image_urls: self.image_urls(&root),
        }))
    }

    fn has_ad_label(&self, root: &ElementRef<'_>) -> bool {
        let label = self.profile.ad_label.trim();
        !label.is_empty()
            && root
                .select(&self.div_sel)
                .any(|div| div.text().collect::<String>().trim() == label)
    }

    fn body_text(&self, root: &ElementRef<'_>) -> String {
        root.select(&self.text_sel)
            .next()
            .map(|container| {
                container
                    .text()
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string()
            })
            .unwrap_or_default()
    }

    fn image_urls(&self, root: &ElementRef<'_>) -> Vec<String> {
        let marker = self.profile.video_thumb_marker.as_str();
        let Some(container) = root.select(&self.photo_sel).next() else {
            return Vec::new();
        };

        container
            .select(&self.img_sel)
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| marker.is_empty() || !src.contains(marker))
            .map(str::to_string)
            .collect()
    }

    /// Resolve the author in priority order: the first span is the display
    /// name, the first `@`-prefixed span is the handle, and failing that a
    /// profile target URL supplies the handle. Inference needs an author
    /// container with more than one span.
    fn resolve_author(&self, root: &ElementRef<'_>, target_url: &str) -> Author {
        let spans: Vec<String> = root
            .select(&self.author_sel)
            .next()
            .map(|container| {
                container
                    .select(&self.span_sel)
                    .map(|span| span.text().map(str::trim).collect::<String>())
                    .collect()
            })
            .unwrap_or_default();

        let display_name = spans.first().cloned().unwrap_or_default();

        if let Some(handle) = spans.iter().find(|text| text.starts_with('@')) {
            return Author {
                display_name,
                profile_url: Some(self.profile.absolute(handle.trim_start_matches('@'))),
                handle: Some(handle.clone()),
            };
        }

        if spans.len() > 1 && self.profile.owns(target_url) {
            if let Some(username) = trailing_segment(target_url) {
                return Author {
                    display_name,
                    handle: Some(format!("@{username}")),
                    profile_url: Some(target_url.to_string()),
                };
            }
        }

        Author {
            display_name,
            handle: None,
            profile_url: None,
        }
    }
}

/// `href` of the nearest anchor enclosing `element`.
fn wrapping_href<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "https://x.com/janedoe";

    fn extractor() -> PageExtractor {
        PageExtractor::new(&SiteProfile::default()).unwrap()
    }

    fn post(author_spans: &[&str], images: &[&str]) -> String {
        let spans: String = author_spans
            .iter()
            .map(|s| format!("<span>{s}</span>"))
            .collect();
        let imgs: String = images
            .iter()
            .map(|src| format!(r#"<img alt="Image" src="{src}">"#))
            .collect();
        format!(
            r#"<div data-testid="User-Name">{spans}</div>
            <a href="/janedoe/status/1750000000000000001"><time datetime="2024-03-05T10:15:30.000000Z">Mar 5</time></a>
            <div data-testid="tweetText"><span>First paragraph</span><span>Second paragraph</span></div>
            <div data-testid="tweetPhoto">{imgs}</div>"#
        )
    }

    fn item(extraction: Extraction) -> ContentItem {
        match extraction {
            Extraction::Item(item) => item,
            Extraction::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn test_extracts_full_post() {
        let markup = post(
            &["Jane Doe", "@janedoe"],
            &["https://pbs.twimg.com/media/GAbc123?format=jpg&name=small"],
        );
        let item = item(extractor().extract(&markup, TARGET).unwrap());

        assert_eq!(
            item.permalink,
            "https://x.com/janedoe/status/1750000000000000001"
        );
        assert_eq!(
            item.published_at.format("%Y年%m月%d日 %H:%M:%S").to_string(),
            "2024年03月05日 10:15:30"
        );
        assert_eq!(item.body_text, "First paragraph\nSecond paragraph");
        assert_eq!(
            item.image_urls,
            vec!["https://pbs.twimg.com/media/GAbc123?format=jpg&name=small"]
        );
        assert_eq!(item.author.display_name, "Jane Doe");
    }

    #[test]
    fn test_advertisement_marker_skips() {
        let markup = format!(
            r#"<div><span style="text-overflow: unset;">Ad</span></div>{}"#,
            post(&["Brand"], &[])
        );
        assert_eq!(
            extractor().extract(&markup, TARGET).unwrap(),
            Extraction::Skipped(SkipReason::Advertisement)
        );
    }

    #[test]
    fn test_advertisement_label_div_skips() {
        let markup = format!("<div>Ad</div>{}", post(&["Brand"], &[]));
        assert_eq!(
            extractor().extract(&markup, TARGET).unwrap(),
            Extraction::Skipped(SkipReason::Advertisement)
        );
    }

    #[test]
    fn test_advertisement_without_time_is_still_ad() {
        let markup = r#"<div><span style="text-overflow: unset;">Ad</span></div><p>Buy now</p>"#;
        assert_eq!(
            extractor().extract(markup, TARGET).unwrap(),
            Extraction::Skipped(SkipReason::Advertisement)
        );
    }

    #[test]
    fn test_missing_time_skips() {
        let markup = r#"<div data-testid="User-Name"><span>Who to follow</span></div>"#;
        assert_eq!(
            extractor().extract(markup, TARGET).unwrap(),
            Extraction::Skipped(SkipReason::MissingTime)
        );
    }

    #[test]
    fn test_missing_permalink_skips() {
        let markup = r#"<div><time datetime="2024-03-05T10:15:30.000Z">Mar 5</time></div>"#;
        assert_eq!(
            extractor().extract(markup, TARGET).unwrap(),
            Extraction::Skipped(SkipReason::MissingPermalink)
        );
    }

    #[test]
    fn test_malformed_timestamp_is_error() {
        let markup = r#"<a href="/janedoe/status/9"><time datetime="March 5th">Mar 5</time></a>"#;
        assert!(extractor().extract(markup, TARGET).is_err());
    }

    #[test]
    fn test_missing_containers_degrade_to_empty() {
        let markup = r#"<a href="/janedoe/status/9"><time datetime="2024-03-05T10:15:30.000Z">Mar 5</time></a>"#;
        let item = item(extractor().extract(markup, "https://example.com/feed").unwrap());
        assert_eq!(item.body_text, "");
        assert!(item.image_urls.is_empty());
        assert_eq!(item.author.display_name, "");
        assert_eq!(item.author.handle, None);
        assert_eq!(item.author.profile_url, None);
    }

    #[test]
    fn test_no_inference_without_author_container() {
        let markup = r#"<a href="/janedoe/status/9"><time datetime="2024-03-05T10:15:30.000Z">Mar 5</time></a>"#;
        let item = item(extractor().extract(markup, TARGET).unwrap());
        assert_eq!(item.author.display_name, "");
        assert_eq!(item.author.handle, None);
        assert_eq!(item.author.profile_url, None);
    }

    #[test]
    fn test_no_inference_from_single_span() {
        let markup = post(&["Jane Doe"], &[]);
        let item = item(extractor().extract(&markup, TARGET).unwrap());
        assert_eq!(item.author.display_name, "Jane Doe");
        assert_eq!(item.author.handle, None);
        assert_eq!(item.author.profile_url, None);
    }

    #[test]
    fn test_video_thumbnails_excluded() {
        let markup = post(
            &["Jane Doe", "@janedoe"],
            &[
                "https://pbs.twimg.com/ext_tw_video_thumb/1/pu/img/a.jpg",
                "https://pbs.twimg.com/media/B?format=jpg&name=small",
            ],
        );
        let item = item(extractor().extract(&markup, TARGET).unwrap());
        assert_eq!(
            item.image_urls,
            vec!["https://pbs.twimg.com/media/B?format=jpg&name=small"]
        );
    }

    #[test]
    fn test_explicit_handle_wins_over_target_url() {
        let markup = post(&["Jane Doe", "Reporter", "@janedoe"], &[]);
        let item = item(
            extractor()
                .extract(&markup, "https://x.com/someone_else")
                .unwrap(),
        );
        assert_eq!(item.author.display_name, "Jane Doe");
        assert_eq!(item.author.handle.as_deref(), Some("@janedoe"));
        assert_eq!(
            item.author.profile_url.as_deref(),
            Some("https://x.com/janedoe")
        );
    }

    #[test]
    fn test_first_at_span_wins() {
        let markup = post(&["Jane Doe", "@janedoe", "·", "@other"], &[]);
        let item = item(extractor().extract(&markup, TARGET).unwrap());
        assert_eq!(item.author.handle.as_deref(), Some("@janedoe"));
    }

    #[test]
    fn test_handle_inferred_from_profile_target() {
        let markup = post(&["Jane Doe", "Reporter"], &[]);
        let item = item(
            extractor()
                .extract(&markup, "https://x.com/JIN_HONG_18?lang=en")
                .unwrap(),
        );
        assert_eq!(item.author.handle.as_deref(), Some("@JIN_HONG_18"));
        assert_eq!(
            item.author.profile_url.as_deref(),
            Some("https://x.com/JIN_HONG_18?lang=en")
        );
    }

    #[test]
    fn test_no_inference_for_foreign_target() {
        let markup = post(&["Jane Doe", "Reporter"], &[]);
        let item = item(
            extractor()
                .extract(&markup, "https://example.com/user1")
                .unwrap(),
        );
        assert_eq!(item.author.handle, None);
        assert_eq!(item.author.profile_url, None);
    }

    #[test]
    fn test_nested_spans_trimmed() {
        let markup = r#"<div data-testid="User-Name"><a><span> Jane <span>Doe</span> </span></a></div>
            <a href="/janedoe/status/2"><time datetime="2024-03-05T10:15:30.000Z">Mar 5</time></a>"#;
        let item = item(extractor().extract(markup, "https://example.com/feed").unwrap());
        assert_eq!(item.author.display_name, "JaneDoe");
    }
}
