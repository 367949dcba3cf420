//! Cache backends
//!
//! A backend stores and restores a set of directories under a key. The
//! coordinator only tells a hit from a miss from an error; locking and
//! versioning are the backend's business.

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::key::CacheKey;

/// Overrides the directory used by [`LocalArchiveCache`]
pub const CACHE_DIR_ENV: &str = "SETUP_ANDROID_CACHE_DIR";

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0:?} is outside of {1:?}")]
    OutsideBase(PathBuf, PathBuf),
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("Cache task failed: {0}")]
    Join(String),
}

/// Result of a restore request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Hit,
    Miss,
}

/// Stores directory sets under a cache key
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn restore(&self, key: &CacheKey, paths: &[PathBuf]) -> Result<RestoreOutcome, CacheError>;

    async fn save(&self, key: &CacheKey, paths: &[PathBuf]) -> Result<(), CacheError>;
}

/// Sidecar describing a stored archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub key: CacheKey,
    pub members: Vec<PathBuf>,
    pub created_at: DateTime<Utc>,
}

/// Keeps one `<key>.tar.gz` per key in a local directory
///
/// Members are archived relative to `base_dir` (the SDK root). A restore
/// unpacks into a staging directory under `base_dir` and merges the result
/// into place only once the archive has been read completely. Entries are
/// immutable once written.
pub struct LocalArchiveCache {
    cache_dir: PathBuf,
    base_dir: PathBuf,
}

impl LocalArchiveCache {
    pub fn new(cache_dir: PathBuf, base_dir: PathBuf) -> Self {
        Self { cache_dir, base_dir }
    }

    /// `SETUP_ANDROID_CACHE_DIR`, else `<user cache dir>/setup-android`
    pub fn default_cache_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("setup-android")
    }

    pub fn archive_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.tar.gz", key))
    }

    pub fn manifest_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    fn relative_members(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, CacheError> {
        paths
            .iter()
            .map(|path| {
                path.strip_prefix(&self.base_dir)
                    .map(Path::to_path_buf)
                    .map_err(|_| CacheError::OutsideBase(path.clone(), self.base_dir.clone()))
            })
            .collect()
    }
}

#[async_trait]
impl CacheBackend for LocalArchiveCache {
    async fn restore(&self, key: &CacheKey, paths: &[PathBuf]) -> Result<RestoreOutcome, CacheError> {
        let archive = self.archive_path(key);
        if !archive.exists() {
            debug!("No cache archive at {:?}", archive);
            return Ok(RestoreOutcome::Miss);
        }

        debug!("Present members before restore: {:?}", paths);
        let base_dir = self.base_dir.clone();
        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            std::fs::create_dir_all(&base_dir)?;

            // Nothing under base_dir changes until the whole archive has unpacked
            let staging = tempfile::Builder::new()
                .prefix(".cache-restore-")
                .tempdir_in(&base_dir)?;
            let mut tar = tar::Archive::new(GzDecoder::new(File::open(&archive)?));
            tar.set_preserve_permissions(true);
            tar.unpack(staging.path())?;

            merge_into(staging.path(), &base_dir)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Join(e.to_string()))??;

        Ok(RestoreOutcome::Hit)
    }

    async fn save(&self, key: &CacheKey, paths: &[PathBuf]) -> Result<(), CacheError> {
        let archive = self.archive_path(key);
        if archive.exists() {
            info!("Cache entry {} already exists, not saving", key);
            return Ok(());
        }

        let members = self.relative_members(paths)?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let cache_dir = self.cache_dir.clone();
        let base_dir = self.base_dir.clone();
        let archived = members.clone();
        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            let staging = tempfile::NamedTempFile::new_in(&cache_dir)?;
            let mut builder = tar::Builder::new(GzEncoder::new(staging, Compression::default()));
            builder.follow_symlinks(false);

            for member in &archived {
                let full = base_dir.join(member);
                if full.is_dir() {
                    builder.append_dir_all(member, &full)?;
                } else {
                    builder.append_path_with_name(&full, member)?;
                }
            }

            let staging = builder.into_inner()?.finish()?;
            staging.persist(&archive).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Join(e.to_string()))??;

        let manifest = CacheManifest {
            key: key.clone(),
            members,
            created_at: Utc::now(),
        };
        tokio::fs::write(self.manifest_path(key), serde_json::to_vec_pretty(&manifest)?).await?;

        Ok(())
    }
}

/// Move the tree at `source` into `target`
///
/// Directories present on both sides are merged; any other existing entry
/// is replaced by the one from `source`.
fn merge_into(source: &Path, target: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = target.join(entry.file_name());

        let existing = std::fs::symlink_metadata(&to).ok();
        match existing {
            Some(meta) if meta.is_dir() && entry.file_type()?.is_dir() => {
                merge_into(&from, &to)?;
                continue;
            }
            Some(meta) if meta.is_dir() => std::fs::remove_dir_all(&to)?,
            Some(_) => std::fs::remove_file(&to)?,
            None => {}
        }
        std::fs::rename(&from, &to)?;
    }
    Ok(())
}
