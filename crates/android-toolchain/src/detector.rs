//! Toolchain Detection
//!
//! Decides whether the requested command-line tools are already installed
//! under an SDK root, either pinned at `cmdline-tools/<version>` or as the
//! `cmdline-tools/latest` alias declaring the same revision.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use setup_android_core::platform::sdkmanager_exe;

/// Directory holding every command-line tools installation
pub const CMDLINE_TOOLS_DIR: &str = "cmdline-tools";

/// Alias installation maintained by the SDK manager itself
pub const LATEST_ALIAS: &str = "latest";

/// Properties file describing an installed package
pub const SOURCE_PROPERTIES: &str = "source.properties";

/// Paths of one installation under `cmdline-tools/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub root: PathBuf,
}

impl Installation {
    pub fn new(sdk_root: &Path, name: &str) -> Self {
        Self {
            root: sdk_root.join(CMDLINE_TOOLS_DIR).join(name),
        }
    }

    pub fn sdkmanager(&self) -> PathBuf {
        self.root.join("bin").join(sdkmanager_exe())
    }

    pub fn properties(&self) -> PathBuf {
        self.root.join(SOURCE_PROPERTIES)
    }
}

/// Locates a usable command-line tools installation
pub struct ToolchainLocator;

impl ToolchainLocator {
    /// Find the SDK manager for `version`, if it is installed
    pub async fn locate(sdk_root: &Path, version: &str) -> Option<PathBuf> {
        let pinned = Installation::new(sdk_root, version);
        let sdkmanager = pinned.sdkmanager();
        if sdkmanager.exists() {
            info!("Found command-line tools {} at {:?}", version, pinned.root);
            return Some(sdkmanager);
        }

        let latest = Installation::new(sdk_root, LATEST_ALIAS);
        if Self::alias_matches(&latest, version).await {
            info!(
                "Found command-line tools {} installed as '{}' at {:?}",
                version, LATEST_ALIAS, latest.root
            );
            return Some(latest.sdkmanager());
        }

        debug!("Command-line tools {} not installed under {:?}", version, sdk_root);
        None
    }

    /// Check that the alias installation is complete and declares `version`
    async fn alias_matches(latest: &Installation, version: &str) -> bool {
        let properties = latest.properties();
        if !latest.root.is_dir() || !properties.exists() || !latest.sdkmanager().exists() {
            debug!("No complete '{}' installation at {:?}", LATEST_ALIAS, latest.root);
            return false;
        }

        let content = match tokio::fs::read_to_string(&properties).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {:?}: {}", properties, e);
                return false;
            }
        };
        debug!("{:?}:\n{}", properties, content);

        Self::declares_revision(&content, version)
    }

    /// Whether a properties document declares `Pkg.Revision=<version>`
    pub fn declares_revision(properties: &str, version: &str) -> bool {
        properties.contains(&format!("Pkg.Revision={}", version))
    }
}
