//! Utility functions and helpers.

pub mod fs;
pub mod http;
pub mod log;

use std::path::Path;

use url::Url;

/// Drop the query string and fragment from a URL.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Last `/`-separated segment of a URL path (query excluded).
pub fn last_path_segment(url: &str) -> &str {
    let base = strip_query(url);
    base.rsplit('/').next().unwrap_or(base)
}

/// Last non-empty path segment of an absolute URL, e.g. the handle in
/// `https://x.com/janedoe/`.
pub fn trailing_segment(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}

/// `file://` URL for a local path; relative paths are made absolute first.
pub fn file_url(path: &Path) -> Option<String> {
    let absolute = std::path::absolute(path).ok()?;
    Url::from_file_path(absolute).ok().map(|u| u.to_string())
}
