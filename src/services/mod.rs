//! Service layer for the harvester.
//!
//! This module contains the per-target logic for:
//! - Block extraction (`PageExtractor`)
//! - Permalink deduplication (`DedupSet`)
//! - The progressive reveal loop (`ScrollDriver`)
//! - Image downloads (`ImageFetcher`)

mod dedup;
mod extractor;
mod images;
mod scroll;

pub use dedup::DedupSet;
pub use extractor::{Extraction, PageExtractor, SkipReason};
pub use images::{FetchOutcome, HttpImageTransport, ImageFetcher, ImagePlan, ImageTransport};
pub use scroll::{PostSink, RevealSummary, ScrollDriver, StallReason};
