//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SiteProfile;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Browser launch and navigation settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Reveal loop tuning
    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Image download settings
    #[serde(default)]
    pub images: ImageConfig,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Site origin, selectors and markers
    #[serde(default)]
    pub site: SiteProfile,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or fall back to defaults.
    ///
    /// The load error, if any, is handed back so it can be reported once
    /// logging is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<AppError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scroll.settle_delay_secs == 0 {
            return Err(AppError::validation("scroll.settle_delay_secs must be > 0"));
        }
        if self.scroll.content_timeout_secs == 0 {
            return Err(AppError::validation(
                "scroll.content_timeout_secs must be > 0",
            ));
        }
        if self.scroll.max_passes == 0 {
            return Err(AppError::validation("scroll.max_passes must be > 0"));
        }
        if self.browser.navigation_timeout_secs == 0 {
            return Err(AppError::validation(
                "browser.navigation_timeout_secs must be > 0",
            ));
        }
        if self.images.timeout_secs == 0 {
            return Err(AppError::validation("images.timeout_secs must be > 0"));
        }
        if self.images.max_concurrent == 0 {
            return Err(AppError::validation("images.max_concurrent must be > 0"));
        }
        if self.images.user_agent.trim().is_empty() {
            return Err(AppError::validation("images.user_agent is empty"));
        }
        self.site.validate()
    }

    /// Proxy shared by the browser and the image transport, if configured.
    pub fn proxy(&self) -> Option<&str> {
        let proxy = self.browser.proxy.trim();
        (!proxy.is_empty()).then_some(proxy)
    }
}

/// Browser launch and navigation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window
    #[serde(default)]
    pub headless: bool,

    /// Proxy server for the browser and image downloads (empty disables)
    #[serde(default = "defaults::proxy")]
    pub proxy: String,

    /// Browser launch timeout in seconds
    #[serde(default = "defaults::launch_timeout")]
    pub launch_timeout_secs: u64,

    /// Page navigation timeout in seconds
    #[serde(default = "defaults::navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            proxy: defaults::proxy(),
            launch_timeout_secs: defaults::launch_timeout(),
            navigation_timeout_secs: defaults::navigation_timeout(),
        }
    }
}

impl BrowserConfig {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

/// Reveal loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Pause after each scroll so new content can render
    #[serde(default = "defaults::settle_delay")]
    pub settle_delay_secs: u64,

    /// How long to wait for a content block to become visible
    #[serde(default = "defaults::content_timeout")]
    pub content_timeout_secs: u64,

    /// Per-block markup read timeout
    #[serde(default = "defaults::block_timeout")]
    pub block_timeout_secs: u64,

    /// Safety cap on reveal passes per target
    #[serde(default = "defaults::max_passes")]
    pub max_passes: usize,

    /// Polling interval while waiting for content
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: defaults::settle_delay(),
            content_timeout_secs: defaults::content_timeout(),
            block_timeout_secs: defaults::block_timeout(),
            max_passes: defaults::max_passes(),
            poll_interval_ms: defaults::poll_interval(),
        }
    }
}

impl ScrollConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    pub fn block_timeout(&self) -> Duration {
        Duration::from_secs(self.block_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Image download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Download timeout in seconds
    #[serde(default = "defaults::image_timeout")]
    pub timeout_secs: u64,

    /// Query appended to the base asset URL to request the original rendition
    #[serde(default = "defaults::quality_suffix")]
    pub quality_suffix: String,

    /// Concurrent downloads per post
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// User-Agent header for image requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::image_timeout(),
            quality_suffix: defaults::quality_suffix(),
            max_concurrent: defaults::max_concurrent(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Input files and output directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// One target URL per line
    #[serde(default = "defaults::targets_file")]
    pub targets_file: String,

    /// Exported browser cookies (JSON array)
    #[serde(default = "defaults::cookies_file")]
    pub cookies_file: String,

    /// Root of the per-author image directories
    #[serde(default = "defaults::image_dir")]
    pub image_dir: String,

    /// Workbook output directory
    #[serde(default = "defaults::results_dir")]
    pub results_dir: String,

    /// Log file directory
    #[serde(default = "defaults::log_dir")]
    pub log_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            targets_file: defaults::targets_file(),
            cookies_file: defaults::cookies_file(),
            image_dir: defaults::image_dir(),
            results_dir: defaults::results_dir(),
            log_dir: defaults::log_dir(),
        }
    }
}

mod defaults {
    // Browser defaults
    pub fn proxy() -> String {
        "http://127.0.0.1:10808".into()
    }
    pub fn launch_timeout() -> u64 {
        60
    }
    pub fn navigation_timeout() -> u64 {
        60
    }

    // Scroll defaults
    pub fn settle_delay() -> u64 {
        2
    }
    pub fn content_timeout() -> u64 {
        30
    }
    pub fn block_timeout() -> u64 {
        10
    }
    pub fn max_passes() -> usize {
        999
    }
    pub fn poll_interval() -> u64 {
        250
    }

    // Image defaults
    pub fn image_timeout() -> u64 {
        30
    }
    pub fn quality_suffix() -> String {
        "?format=jpg&name=orig".into()
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }

    // Path defaults
    pub fn targets_file() -> String {
        "urlTarget.txt".into()
    }
    pub fn cookies_file() -> String {
        "cookies.json".into()
    }
    pub fn image_dir() -> String {
        "images".into()
    }
    pub fn results_dir() -> String {
        "results".into()
    }
    pub fn log_dir() -> String {
        "logs".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_settle_delay() {
        let mut config = Config::default();
        config.scroll.settle_delay_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pass_cap() {
        let mut config = Config::default();
        config.scroll.max_passes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scroll]
            max_passes = 5

            [browser]
            proxy = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.scroll.max_passes, 5);
        assert_eq!(config.scroll.settle_delay_secs, 2);
        assert_eq!(config.scroll.content_timeout_secs, 30);
        assert_eq!(config.images.timeout_secs, 30);
        assert_eq!(config.site.origin, "https://x.com");
        assert_eq!(config.proxy(), None);
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let (config, error) = Config::load_or_default("/definitely/not/here.toml");
        assert!(matches!(error, Some(AppError::Io(_))));
        assert_eq!(config.paths.targets_file, "urlTarget.txt");
        assert_eq!(config.proxy(), Some("http://127.0.0.1:10808"));
    }

    #[test]
    fn bundled_sample_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../../harvester.toml")).unwrap();
        let defaults = Config::default();

        config.validate().unwrap();
        assert_eq!(config.scroll.max_passes, defaults.scroll.max_passes);
        assert_eq!(config.images.quality_suffix, defaults.images.quality_suffix);
        assert_eq!(config.site.ad_markers, defaults.site.ad_markers);
        assert_eq!(config.site.photo_container, defaults.site.photo_container);
    }
}
