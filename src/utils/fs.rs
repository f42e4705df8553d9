// src/utils/fs.rs

//! Filesystem helpers.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;

/// Folder name used when an author label sanitizes to nothing.
pub const FALLBACK_DIR_NAME: &str = "Unknown_Author";

/// Keep letters, digits, spaces, `-` and `_`; trim the result.
pub fn sanitize_dir_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        FALLBACK_DIR_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Create each directory (and parents) if missing.
pub fn ensure_dirs<P: AsRef<Path>>(dirs: &[P]) -> Result<()> {
    for dir in dirs {
        std::fs::create_dir_all(dir.as_ref())?;
    }
    Ok(())
}

/// `<dir>/<stem>_<timestamp>.<ext>`
pub fn stamped_path(dir: &Path, stem: &str, timestamp: &str, ext: &str) -> PathBuf {
    dir.join(format!("{stem}_{timestamp}.{ext}"))
}

/// Hand a file to the desktop's default application. Failures are logged.
pub fn open_with_default_app(path: &Path) {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };

    match command.arg(path).spawn() {
        Ok(_) => log::info!("Opened {}", path.display()),
        Err(e) => log::error!("Could not open {}: {}", path.display(), e),
    }
}
