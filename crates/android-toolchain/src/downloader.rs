//! Toolchain Downloader
//!
//! Downloads and installs the Android SDK command-line tools for a release
//! when no usable installation exists under the SDK root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use setup_android_core::{HostPlatform, ReleaseId};

use crate::detector::{Installation, ToolchainLocator, CMDLINE_TOOLS_DIR};

/// Base URL of Google's SDK repository
pub const REPOSITORY_URL: &str = "https://dl.google.com/android/repository";

/// Marker file the SDK manager expects at the SDK root
pub const REPOSITORIES_CFG: &str = "repositories.cfg";

/// Download error types
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("sdkmanager not found at {0:?} after installation")]
    MissingManager(PathBuf),
}

/// Fetches a remote archive to a local file
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, url: &str, target: &Path) -> Result<(), DownloadError>;
}

/// Fetches archives over HTTP(S)
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `connect_timeout` bounds connection setup only, so a slow transfer
    /// of a large archive is never cut off
    pub fn new(connect_timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("setup-android/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, target: &Path) -> Result<(), DownloadError> {
        info!("Downloading {} to {:?}", url, target);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::InvalidResponse(
                format!("HTTP {} for {}", response.status(), url)
            ));
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut downloaded: u64 = 0;

        let mut file = tokio::fs::File::create(target).await?;
        let mut stream = response.bytes_stream();

        use futures::StreamExt;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await?;

        debug!("Downloaded {} of {} bytes", downloaded, total_size);
        Ok(())
    }
}

/// Archive URL of a command-line tools release for a platform
pub fn cmdline_tools_url(platform: HostPlatform, release: &ReleaseId) -> String {
    format!(
        "{}/commandlinetools-{}-{}_latest.zip",
        REPOSITORY_URL,
        platform.archive_tag(),
        release
    )
}

/// Installs command-line tools under `cmdline-tools/<version>`
pub struct ToolchainInstaller {
    fetcher: Arc<dyn ArchiveFetcher>,
    platform: Option<HostPlatform>,
}

impl ToolchainInstaller {
    pub fn new(fetcher: Arc<dyn ArchiveFetcher>, platform: Option<HostPlatform>) -> Self {
        Self { fetcher, platform }
    }

    /// Make sure the tools for `version` are installed and return the
    /// sdkmanager path
    pub async fn ensure(
        &self,
        sdk_root: &Path,
        version: &str,
        release: &ReleaseId,
    ) -> Result<PathBuf, DownloadError> {
        let sdkmanager = match ToolchainLocator::locate(sdk_root, version).await {
            Some(path) => path,
            None => self.install(sdk_root, version, release).await?,
        };

        // sdkmanager warns about a missing repositories.cfg on every call
        tokio::fs::write(sdk_root.join(REPOSITORIES_CFG), b"").await?;

        Ok(sdkmanager)
    }

    /// Download the release archive and move it into place
    ///
    /// Whatever already sits at the version-pinned path is deleted first;
    /// the new tools are never merged into an old directory.
    pub async fn install(
        &self,
        sdk_root: &Path,
        version: &str,
        release: &ReleaseId,
    ) -> Result<PathBuf, DownloadError> {
        let platform = self.platform.ok_or_else(|| {
            DownloadError::UnsupportedPlatform(std::env::consts::OS.to_string())
        })?;
        let url = cmdline_tools_url(platform, release);

        info!("Installing command-line tools {} ({})", version, release);
        tokio::fs::create_dir_all(sdk_root).await?;

        let download_dir = tempfile::tempdir()?;
        let archive = download_dir.path().join(format!(
            "commandlinetools-{}-{}_latest.zip",
            platform.archive_tag(),
            release
        ));
        self.fetcher.fetch(&url, &archive).await?;

        let staging = tempfile::Builder::new()
            .prefix(".cmdline-tools-staging-")
            .tempdir_in(sdk_root)?;
        extract_zip(&archive, staging.path()).await?;

        let extracted = staging.path().join(CMDLINE_TOOLS_DIR);
        if !extracted.is_dir() {
            return Err(DownloadError::Extraction(format!(
                "archive {} has no {}/ directory",
                url, CMDLINE_TOOLS_DIR
            )));
        }

        let installation = Installation::new(sdk_root, version);
        if installation.root.exists() {
            info!("Removing stale installation at {:?}", installation.root);
            tokio::fs::remove_dir_all(&installation.root).await?;
        }
        if let Some(parent) = installation.root.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&extracted, &installation.root).await?;

        let sdkmanager = installation.sdkmanager();
        if !sdkmanager.exists() {
            return Err(DownloadError::MissingManager(sdkmanager));
        }

        info!("Command-line tools {} installed to {:?}", version, installation.root);
        Ok(sdkmanager)
    }
}

/// Extract a ZIP file
pub async fn extract_zip(archive: &Path, target_dir: &Path) -> Result<(), DownloadError> {
    info!("Extracting {:?} to {:?}", archive, target_dir);

    let archive = archive.to_path_buf();
    let target_dir = target_dir.to_path_buf();

    // zip is synchronous
    tokio::task::spawn_blocking(move || -> Result<(), DownloadError> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|e| DownloadError::Extraction(e.to_string()))?;

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)
                .map_err(|e| DownloadError::Extraction(e.to_string()))?;

            let name = entry
                .enclosed_name()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    DownloadError::Extraction(format!("unsafe entry path: {}", entry.name()))
                })?;
            let outpath = target_dir.join(name);

            if entry.is_dir() {
                std::fs::create_dir_all(&outpath)?;
            } else {
                if let Some(parent) = outpath.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let mut outfile = std::fs::File::create(&outpath)?;
                std::io::copy(&mut entry, &mut outfile)?;
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }
        }

        Ok(())
    }).await.map_err(|e| DownloadError::Extraction(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use setup_android_core::platform::sdkmanager_exe;

    /// Serves a generated command-line tools archive and counts fetches
    struct FakeFetcher {
        revision: String,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(revision: &str) -> Arc<Self> {
            Arc::new(Self {
                revision: revision.to_string(),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArchiveFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, target: &Path) -> Result<(), DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            write_cmdline_tools_zip(target, &self.revision);
            Ok(())
        }
    }

    fn write_cmdline_tools_zip(path: &Path, revision: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default().unix_permissions(0o755);

        zip.add_directory("cmdline-tools/bin/", options).unwrap();
        zip.start_file(format!("cmdline-tools/bin/{}", sdkmanager_exe()), options)
            .unwrap();
        zip.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
        zip.start_file("cmdline-tools/source.properties", options)
            .unwrap();
        zip.write_all(format!("Pkg.Revision={}\n", revision).as_bytes())
            .unwrap();
        zip.finish().unwrap();
    }

    fn release(id: &str) -> ReleaseId {
        ReleaseId::parse(id).unwrap()
    }

    #[test]
    fn test_cmdline_tools_url() {
        assert_eq!(
            cmdline_tools_url(HostPlatform::Linux, &release("9862592")),
            "https://dl.google.com/android/repository/commandlinetools-linux-9862592_latest.zip"
        );
        assert_eq!(
            cmdline_tools_url(HostPlatform::Windows, &release("11076708")),
            "https://dl.google.com/android/repository/commandlinetools-win-11076708_latest.zip"
        );
    }

    #[tokio::test]
    async fn test_slow_body_outlives_connect_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nab")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(1500)).await;
            socket.write_all(b"cd").await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("archive.zip");
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        fetcher
            .fetch(&format!("http://{}/archive.zip", addr), &target)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn test_install_then_reuse() {
        let sdk = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new("10.0");
        let installer = ToolchainInstaller::new(fetcher.clone(), Some(HostPlatform::Linux));

        let first = installer.ensure(sdk.path(), "10.0", &release("9862592")).await.unwrap();
        assert_eq!(first, Installation::new(sdk.path(), "10.0").sdkmanager());
        assert!(first.exists());
        assert!(sdk.path().join(REPOSITORIES_CFG).exists());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(
            fetcher.urls.lock().unwrap()[0],
            cmdline_tools_url(HostPlatform::Linux, &release("9862592"))
        );

        let second = installer.ensure(sdk.path(), "10.0", &release("9862592")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_existing_pinned_installation_skips_download() {
        let sdk = tempfile::tempdir().unwrap();
        let install = Installation::new(sdk.path(), "12.0");
        std::fs::create_dir_all(install.root.join("bin")).unwrap();
        std::fs::write(install.sdkmanager(), "").unwrap();

        let fetcher = FakeFetcher::new("12.0");
        let installer = ToolchainInstaller::new(fetcher.clone(), Some(HostPlatform::Linux));
        installer.ensure(sdk.path(), "12.0", &release("11076708")).await.unwrap();

        assert_eq!(fetcher.calls(), 0);
        assert!(sdk.path().join(REPOSITORIES_CFG).exists());
    }

    #[tokio::test]
    async fn test_stale_installation_is_replaced() {
        let sdk = tempfile::tempdir().unwrap();
        let install = Installation::new(sdk.path(), "10.0");
        std::fs::create_dir_all(&install.root).unwrap();
        std::fs::write(install.root.join("leftover.jar"), "partial").unwrap();

        let fetcher = FakeFetcher::new("10.0");
        let installer = ToolchainInstaller::new(fetcher.clone(), Some(HostPlatform::Linux));
        installer.ensure(sdk.path(), "10.0", &release("9862592")).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(!install.root.join("leftover.jar").exists());
        assert!(install.properties().exists());
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let sdk = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::new("10.0");
        let installer = ToolchainInstaller::new(fetcher.clone(), None);

        let err = installer
            .ensure(sdk.path(), "10.0", &release("9862592"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::UnsupportedPlatform(_)));
        assert_eq!(fetcher.calls(), 0);
    }
}
