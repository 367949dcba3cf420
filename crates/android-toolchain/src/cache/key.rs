//! Cache key computation
//!
//! A key covers everything that changes what ends up under the SDK root:
//! host platform, architecture, command-line tools release and the set of
//! requested packages.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Prefix shared by every key this action writes
pub const CACHE_KEY_PREFIX: &str = "setup-android";

/// Hex characters of the package digest kept in a key
pub const PACKAGES_DIGEST_LEN: usize = 8;

/// Identity of one cached SDK state
///
/// Format: `setup-android-<platform>-<arch>-<release>-<packages digest>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the key for a platform, architecture, release and package list
pub fn build_key(platform: &str, arch: &str, release: &str, packages: &[String]) -> CacheKey {
    CacheKey(format!(
        "{}-{}-{}-{}-{}",
        CACHE_KEY_PREFIX,
        platform,
        arch,
        release,
        packages_digest(packages)
    ))
}

/// Truncated SHA-256 of the sorted, comma-joined package list
///
/// Sorting makes the digest independent of request order; duplicates are
/// kept and do change it.
pub fn packages_digest(packages: &[String]) -> String {
    let mut sorted: Vec<&str> = packages.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(sorted.join(",").as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(PACKAGES_DIGEST_LEN);
    digest
}
