// src/services/images.rs

//! Image download into per-author folders.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::ImageConfig;
use crate::utils::fs::sanitize_dir_name;
use crate::utils::http::create_async_client;
use crate::utils::{last_path_segment, strip_query};

/// Retrieves image bytes.
#[async_trait]
pub trait ImageTransport: Send + Sync {
    /// Fetch `url`; transport failures and non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed transport sharing one client (and proxy) across downloads.
pub struct HttpImageTransport {
    client: Client,
}

impl HttpImageTransport {
    pub fn new(config: &ImageConfig, proxy: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config, proxy)?,
        })
    }
}

#[async_trait]
impl ImageTransport for HttpImageTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Where one remote image goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlan {
    /// URL requested for the original-quality rendition
    pub quality_url: String,
    /// Destination file name (`<last segment>.jpg`)
    pub file_name: String,
}

/// Result of materializing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Absolute destination path, recorded whether or not the download succeeded
    pub local_path: PathBuf,
    pub downloaded: bool,
}

/// Downloads post images under `<root>/<sanitized author>/`.
pub struct ImageFetcher {
    root: PathBuf,
    quality_suffix: String,
    transport: Arc<dyn ImageTransport>,
}

impl ImageFetcher {
    pub fn new(
        root: impl Into<PathBuf>,
        quality_suffix: impl Into<String>,
        transport: Arc<dyn ImageTransport>,
    ) -> Self {
        Self {
            root: root.into(),
            quality_suffix: quality_suffix.into(),
            transport,
        }
    }

    /// Derive the quality URL and file name for a remote image URL.
    pub fn plan(&self, remote_url: &str) -> ImagePlan {
        let base = strip_query(remote_url);
        let name = last_path_segment(base);
        let name = if name.is_empty() { "image" } else { name };
        ImagePlan {
            quality_url: format!("{base}{}", self.quality_suffix),
            file_name: format!("{name}.jpg"),
        }
    }

    /// Absolute directory for an author's images.
    pub fn author_dir(&self, author: &str) -> PathBuf {
        absolute(&self.root.join(sanitize_dir_name(author)))
    }

    /// Download `remote_url` into the author's folder.
    ///
    /// Failures are logged against `label` and reported through
    /// [`FetchOutcome::downloaded`]; the destination path is returned either way.
    pub async fn fetch(&self, label: &str, remote_url: &str, author: &str) -> FetchOutcome {
        let plan = self.plan(remote_url);
        let dir = self.author_dir(author);
        let local_path = dir.join(&plan.file_name);

        match self.download(&plan.quality_url, &dir, &local_path).await {
            Ok(()) => {
                log::info!("{label} -> Downloaded: {}", local_path.display());
                FetchOutcome {
                    local_path,
                    downloaded: true,
                }
            }
            Err(e) => {
                log::error!("{label} -> Error downloading image {}: {}", plan.quality_url, e);
                FetchOutcome {
                    local_path,
                    downloaded: false,
                }
            }
        }
    }

    async fn download(&self, url: &str, dir: &Path, local_path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let bytes = self.transport.fetch(url).await?;
        tokio::fs::write(local_path, bytes).await?;
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use tempfile::TempDir;

    /// Serves canned bodies; unknown URLs answer 404.
    #[derive(Default)]
    struct CannedTransport {
        bodies: HashMap<String, Vec<u8>>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageTransport for CannedTransport {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_string());
            self.bodies.get(url).cloned().ok_or(AppError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn fetcher(root: &Path, transport: CannedTransport) -> (ImageFetcher, Arc<CannedTransport>) {
        let transport = Arc::new(transport);
        (
            ImageFetcher::new(root, "?format=jpg&name=orig", transport.clone()),
            transport,
        )
    }

    #[test]
    fn test_plan_strips_query_and_appends_suffix() {
        let (fetcher, _) = fetcher(Path::new("images"), CannedTransport::default());
        let plan = fetcher.plan("https://pbs.twimg.com/media/GAbc123?format=jpg&name=small");
        assert_eq!(
            plan.quality_url,
            "https://pbs.twimg.com/media/GAbc123?format=jpg&name=orig"
        );
        assert_eq!(plan.file_name, "GAbc123.jpg");
    }

    #[test]
    fn test_plan_without_query_keeps_full_name() {
        let (fetcher, _) = fetcher(Path::new("images"), CannedTransport::default());
        let plan = fetcher.plan("https://pbs.twimg.com/media/GAbc123");
        assert_eq!(plan.file_name, "GAbc123.jpg");
    }

    #[tokio::test]
    async fn test_fetch_writes_into_author_folder() {
        let tmp = TempDir::new().unwrap();
        let mut transport = CannedTransport::default();
        transport.bodies.insert(
            "https://pbs.twimg.com/media/GAbc123?format=jpg&name=orig".to_string(),
            b"jpeg-bytes".to_vec(),
        );
        let (fetcher, _) = fetcher(tmp.path(), transport);

        let outcome = fetcher
            .fetch(
                "Task-1",
                "https://pbs.twimg.com/media/GAbc123?format=jpg&name=small",
                "Jane Doe @janedoe",
            )
            .await;

        assert!(outcome.downloaded);
        assert!(outcome.local_path.is_absolute());
        assert!(outcome.local_path.ends_with("Jane Doe janedoe/GAbc123.jpg"));
        assert_eq!(std::fs::read(&outcome.local_path).unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_failed_fetch_still_reports_destination() {
        let tmp = TempDir::new().unwrap();
        let (fetcher, transport) = fetcher(tmp.path(), CannedTransport::default());

        let outcome = fetcher
            .fetch("Task-1", "https://pbs.twimg.com/media/Missing?name=small", "")
            .await;

        assert!(!outcome.downloaded);
        assert!(outcome.local_path.ends_with("Unknown_Author/Missing.jpg"));
        assert!(!outcome.local_path.exists());
        assert_eq!(
            transport.requested.lock().unwrap().as_slice(),
            ["https://pbs.twimg.com/media/Missing?format=jpg&name=orig"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_fetches_share_new_folder() {
        let tmp = TempDir::new().unwrap();
        let mut transport = CannedTransport::default();
        for name in ["A", "B", "C", "D"] {
            transport.bodies.insert(
                format!("https://pbs.twimg.com/media/{name}?format=jpg&name=orig"),
                name.as_bytes().to_vec(),
            );
        }
        let (fetcher, _) = fetcher(tmp.path(), transport);

        let outcomes = futures::future::join_all(["A", "B", "C", "D"].map(|name| {
            let url = format!("https://pbs.twimg.com/media/{name}?name=small");
            let fetcher = &fetcher;
            async move { fetcher.fetch("Task-1", &url, "New Author").await }
        }))
        .await;

        assert!(outcomes.iter().all(|o| o.downloaded));
        assert_eq!(std::fs::read_dir(tmp.path().join("New Author")).unwrap().count(), 4);
    }
}
