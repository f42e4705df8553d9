//! Target list loading.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

/// Parse a target list: one absolute URL per line.
///
/// Blank lines and lines not starting with `http` are ignored; repeated URLs
/// are kept once, in first-seen order.
pub fn parse_targets(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.starts_with("http"))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}

/// Load targets from a file.
///
/// A missing file or a file without any usable URL is an error.
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AppError::config(format!(
            "target file '{}' not found; create it with one URL per line",
            path.display()
        )));
    }

    let targets = parse_targets(&fs::read_to_string(path)?);
    if targets.is_empty() {
        return Err(AppError::config(format!(
            "target file '{}' is empty or contains no valid URLs",
            path.display()
        )));
    }
    Ok(targets)
}
