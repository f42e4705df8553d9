// src/pipeline/collector.rs

//! Run-wide record and author collection shared by every pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::{AuthorEntry, ContentRecord};

#[derive(Debug, Default)]
struct Collected {
    records: Vec<ContentRecord>,
    authors: Vec<AuthorEntry>,
    author_names: HashSet<String>,
}

/// Point-in-time copy of everything collected so far.
#[derive(Debug, Clone, Default)]
pub struct CollectedSnapshot {
    pub records: Vec<ContentRecord>,
    /// Distinct authors in first-registration order
    pub authors: Vec<AuthorEntry>,
}

/// Append-only record list plus first-write-wins author map.
///
/// One lock guards both so appends and registrations are atomic with
/// respect to each other. Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub struct ConcurrentCollector {
    inner: Arc<Mutex<Collected>>,
}

impl ConcurrentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, record: ContentRecord) {
        self.inner.lock().await.records.push(record);
    }

    /// Register `name -> profile_url` unless `name` is already known.
    ///
    /// Returns `true` when this call inserted the entry.
    pub async fn register_author_if_absent(&self, name: &str, profile_url: &str) -> bool {
        let mut collected = self.inner.lock().await;
        if !collected.author_names.insert(name.to_string()) {
            return false;
        }
        collected.authors.push(AuthorEntry {
            display_name: name.to_string(),
            profile_url: profile_url.to_string(),
        });
        true
    }

    pub async fn record_count(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn author_count(&self) -> usize {
        self.inner.lock().await.authors.len()
    }

    pub async fn snapshot(&self) -> CollectedSnapshot {
        let collected = self.inner.lock().await;
        CollectedSnapshot {
            records: collected.records.clone(),
            authors: collected.authors.clone(),
        }
    }
}
