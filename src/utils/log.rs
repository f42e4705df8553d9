// src/utils/log.rs

//! Dual-sink log output.
//!
//! [`TeeWriter`] duplicates every formatted log line to stderr and to the
//! per-run log file; the binary installs it as the `env_logger` pipe target.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Writes to stderr and, when present, to a log file.
pub struct TeeWriter<W: Write = File> {
    file: Option<W>,
}

impl TeeWriter<File> {
    /// Create (truncate) the log file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: Some(File::create(path)?),
        })
    }
}

impl<W: Write> TeeWriter<W> {
    pub fn new(file: Option<W>) -> Self {
        Self { file }
    }
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}
