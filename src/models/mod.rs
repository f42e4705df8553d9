// src/models/mod.rs

//! Domain models for the harvester application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod cookie;
mod record;
mod site;
mod target;

// Re-export all public types
pub use config::{BrowserConfig, Config, ImageConfig, PathsConfig, ScrollConfig};
pub use cookie::{SameSite, SessionCookie};
pub use record::{
    Author, AuthorEntry, ContentItem, ContentRecord, DISPLAY_TIME_FORMAT, SOURCE_TIME_FORMAT,
    parse_published_at,
};
pub use site::{SiteProfile, parse_selector};
pub use target::{load_targets, parse_targets};
