//! SDK caching
//!
//! Restores and saves the installed SDK directories under a content-derived
//! key so later runs with the same platform, architecture, tools release and
//! package set skip the downloads.
//!
//! ## Key
//!
//! `setup-android-<platform>-<arch>-<release>-<digest>` where the digest is
//! the first 8 hex characters of SHA-256 over the sorted, comma-joined
//! package list.
//!
//! ## Entry
//!
//! Whichever of `cmdline-tools`, `platform-tools`, `tools`, `licenses`,
//! `platforms`, `build-tools`, `system-images` and `extras` exist under the
//! SDK root when the backend is called.

mod backend;
mod coordinator;
mod key;

pub use backend::{CacheBackend, CacheError, CacheManifest, LocalArchiveCache, RestoreOutcome, CACHE_DIR_ENV};
pub use coordinator::{existing_members, CacheCoordinator, CACHE_MEMBERS};
pub use key::{build_key, packages_digest, CacheKey, CACHE_KEY_PREFIX};
