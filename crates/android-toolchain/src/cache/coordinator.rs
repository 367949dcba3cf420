//! Cache coordination around the install steps
//!
//! Restore runs before any package is installed, save after the package
//! loop. Both are best effort: a failing backend produces a warning and the
//! run continues as if caching were off for that call.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use setup_android_core::{actions, PackageSet, ReleaseId};

use super::backend::{CacheBackend, RestoreOutcome};
use super::key::{build_key, CacheKey};

/// SDK root directories that make up a cache entry
pub const CACHE_MEMBERS: &[&str] = &[
    "cmdline-tools",
    "platform-tools",
    "tools",
    "licenses",
    "platforms",
    "build-tools",
    "system-images",
    "extras",
];

/// Cache members currently present under the SDK root
pub fn existing_members(sdk_root: &Path) -> Vec<PathBuf> {
    CACHE_MEMBERS
        .iter()
        .map(|member| sdk_root.join(member))
        .filter(|path| path.exists())
        .collect()
}

/// Wraps a [`CacheBackend`] with key derivation and error isolation
pub struct CacheCoordinator {
    backend: Option<Box<dyn CacheBackend>>,
    sdk_root: PathBuf,
    platform: String,
    arch: String,
}

impl CacheCoordinator {
    /// Coordinator that caches through `backend`
    pub fn new(backend: Box<dyn CacheBackend>, sdk_root: PathBuf) -> Self {
        Self {
            backend: Some(backend),
            sdk_root,
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Coordinator for runs with caching turned off
    pub fn disabled(sdk_root: PathBuf) -> Self {
        Self {
            backend: None,
            sdk_root,
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Override the platform and architecture that go into keys
    pub fn with_host(mut self, platform: impl Into<String>, arch: impl Into<String>) -> Self {
        self.platform = platform.into();
        self.arch = arch.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Key for the given release and packages on this host
    pub fn key_for(&self, release: &ReleaseId, packages: &PackageSet) -> CacheKey {
        build_key(&self.platform, &self.arch, release.as_str(), packages.as_slice())
    }

    /// Restore a previous SDK state
    ///
    /// Returns the key on hit, on miss and when the backend fails, since it
    /// is needed for the save at the end of the run. `None` only when
    /// caching is disabled.
    pub async fn restore(&self, release: &ReleaseId, packages: &PackageSet) -> Option<CacheKey> {
        let backend = self.backend.as_ref()?;
        let key = self.key_for(release, packages);
        let members = existing_members(&self.sdk_root);

        match backend.restore(&key, &members).await {
            Ok(RestoreOutcome::Hit) => info!("Restored SDK from cache key {}", key),
            Ok(RestoreOutcome::Miss) => info!("No cache entry for key {}", key),
            Err(e) => {
                let message = format!("Failed to restore cache {}: {}", key, e);
                warn!("{}", message);
                actions::warning(&message);
            }
        }

        Some(key)
    }

    /// Save the current SDK state under `key`
    pub async fn save(&self, key: Option<&CacheKey>) {
        let (Some(backend), Some(key)) = (self.backend.as_ref(), key) else {
            return;
        };
        let members = existing_members(&self.sdk_root);

        match backend.save(key, &members).await {
            Ok(()) => info!("Saved {} SDK directories under cache key {}", members.len(), key),
            Err(e) => {
                let message = format!("Failed to save cache {}: {}", key, e);
                warn!("{}", message);
                actions::warning(&message);
            }
        }
    }
}
