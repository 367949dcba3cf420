//! Android Toolchain Management
//!
//! Handles resolution, installation and caching of:
//! - Android SDK command-line tools
//! - SDK packages installed through sdkmanager
//! - The environment exported to later workflow steps

pub mod cache;
pub mod detector;
pub mod downloader;
pub mod env;
pub mod sdk_manager;
pub mod version;

pub use cache::{CacheBackend, CacheCoordinator, CacheKey, LocalArchiveCache};
pub use detector::{Installation, ToolchainLocator};
pub use downloader::{ArchiveFetcher, DownloadError, HttpFetcher, ToolchainInstaller};
pub use env::EnvironmentConfig;
pub use sdk_manager::{SdkManager, SdkManagerError};

/// Connect timeout for archive downloads, in seconds; the transfer itself
/// is not limited
pub const CONNECT_TIMEOUT_SECS: u64 = 30;
