//! XLT download
//!
//! Fetches an XLT release archive and unpacks it into the project lib dir.

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use super::archive::extract_zip;
use crate::config::XltPaths;
use crate::error::{XltError, XltResult};
use crate::files::{delete_dir_recursive, delete_file};

/// Location of the official XLT releases
pub const XLT_RELEASES_URL: &str = "https://lab.xceptance.de/releases/xlt";

/// Downloads and unpacks XLT releases
pub struct Provisioner {
    client: Client,
    releases_url: String,
    paths: XltPaths,
}

impl Provisioner {
    pub fn new(paths: XltPaths) -> XltResult<Self> {
        Self::with_timeout(paths, 300)
    }

    pub fn with_timeout(paths: XltPaths, timeout_secs: u64) -> XltResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| XltError::Download(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            releases_url: XLT_RELEASES_URL.to_string(),
            paths,
        })
    }

    /// Use a mirror instead of the official release server
    pub fn releases_url(mut self, url: impl Into<String>) -> Self {
        self.releases_url = url.into();
        self
    }

    pub fn download_url(&self) -> String {
        let version = &self.paths.xlt_version;
        format!(
            "{}/{version}/xlt-{version}.zip",
            self.releases_url.trim_end_matches('/')
        )
    }

    /// Clear the lib directory, download the configured release and unpack
    /// it. Returns the unpacked XLT directory.
    pub async fn fetch_and_unpack(&self) -> XltResult<PathBuf> {
        let version = &self.paths.xlt_version;
        let lib_dir = self.paths.lib_dir();

        delete_dir_recursive(&lib_dir)?;
        fs::create_dir_all(&lib_dir).await?;

        let archive = lib_dir.join(format!("xlt-{version}.zip"));
        let url = self.download_url();

        if let Err(e) = self.download(&url, &archive).await {
            delete_file(&archive)?;
            return Err(e);
        }

        let (src, dest) = (archive.clone(), lib_dir.clone());
        let extracted = tokio::task::spawn_blocking(move || extract_zip(&src, &dest))
            .await
            .map_err(|e| XltError::Archive(format!("extraction task failed: {e}")))?;

        if let Err(e) = extracted {
            warn!("Removing unusable archive {}", archive.display());
            delete_file(&archive)?;
            return Err(e);
        }

        let xlt_dir = lib_dir.join(format!("xlt-{version}"));
        info!("XLT {} available at {}", version, xlt_dir.display());
        Ok(xlt_dir)
    }

    async fn download(&self, url: &str, dest: &Path) -> XltResult<()> {
        info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| XltError::Download(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(XltError::Download(format!("{url} returned {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| XltError::Download(format!("{url}: {e}")))?;

        fs::write(dest, &bytes).await?;
        info!("Downloaded {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }
}
