//! Action Configuration
//!
//! Reads the step inputs GitHub passes to the action as `INPUT_<NAME>`
//! environment variables and validates them:
//! - `cmdline-tools-version` (required)
//! - `accept-android-sdk-licenses`
//! - `log-accepted-android-sdk-licenses`
//! - `packages`
//! - `cache`
//!
//! Also resolves the SDK root directory the rest of the run installs into.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SetupError};
use crate::platform::HostPlatform;

pub const INPUT_CMDLINE_TOOLS_VERSION: &str = "cmdline-tools-version";
pub const INPUT_ACCEPT_LICENSES: &str = "accept-android-sdk-licenses";
pub const INPUT_LOG_ACCEPTED_LICENSES: &str = "log-accepted-android-sdk-licenses";
pub const INPUT_PACKAGES: &str = "packages";
pub const INPUT_CACHE: &str = "cache";

/// Packages installed when the `packages` input is left empty
pub const DEFAULT_PACKAGES: &str = "tools platform-tools";

/// Release identifier of a command-line tools build (e.g. `9862592`)
///
/// Used verbatim in the download URL and, when no short version is known,
/// as a directory name under `cmdline-tools/`, so it may not contain path
/// separators or be a relative path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(SetupError::MissingInput(INPUT_CMDLINE_TOOLS_VERSION.to_string()));
        }
        if value.contains('/') || value.contains('\\') {
            return Err(SetupError::invalid(
                INPUT_CMDLINE_TOOLS_VERSION,
                format!("'{}' must not contain path separators", value),
            ));
        }
        if value == "." || value == ".." {
            return Err(SetupError::invalid(
                INPUT_CMDLINE_TOOLS_VERSION,
                format!("'{}' is not a release identifier", value),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Requested SDK packages in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageSet(Vec<String>);

impl PackageSet {
    /// Split a whitespace separated list, dropping empty entries
    pub fn parse(raw: &str) -> Self {
        Self(raw.split_whitespace().map(str::to_string).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for PackageSet {
    fn from(packages: Vec<String>) -> Self {
        Self(
            packages
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }
}

/// Validated action inputs
#[derive(Debug, Clone)]
pub struct ActionInputs {
    pub cmdline_tools_version: ReleaseId,
    pub accept_licenses: bool,
    pub log_accepted_licenses: bool,
    pub packages: PackageSet,
    pub cache: bool,
}

impl ActionInputs {
    /// Read inputs from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(input_env_name(name)).ok())
    }

    /// Read inputs through an arbitrary lookup keyed by input name
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let version = get(INPUT_CMDLINE_TOOLS_VERSION)
            .ok_or_else(|| SetupError::MissingInput(INPUT_CMDLINE_TOOLS_VERSION.to_string()))?;

        let inputs = Self {
            cmdline_tools_version: ReleaseId::parse(&version)?,
            accept_licenses: parse_bool(INPUT_ACCEPT_LICENSES, get(INPUT_ACCEPT_LICENSES), true)?,
            log_accepted_licenses: parse_bool(
                INPUT_LOG_ACCEPTED_LICENSES,
                get(INPUT_LOG_ACCEPTED_LICENSES),
                true,
            )?,
            packages: PackageSet::parse(
                get(INPUT_PACKAGES).as_deref().unwrap_or(DEFAULT_PACKAGES),
            ),
            cache: parse_bool(INPUT_CACHE, get(INPUT_CACHE), false)?,
        };

        debug!("Action inputs: {:?}", inputs);
        Ok(inputs)
    }
}

/// Environment variable GitHub uses to pass an input
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Parse a YAML 1.2 "core schema" boolean the way the Actions toolkit does
fn parse_bool(name: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        None => Ok(default),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(other) => Err(SetupError::invalid(
            name,
            format!("'{}' is not a boolean (expected true or false)", other),
        )),
    }
}

/// Resolve the SDK root from the environment
///
/// `ANDROID_SDK_ROOT` wins over `ANDROID_HOME`; without either the SDK goes
/// to `~/android`.
pub fn resolve_sdk_root() -> PathBuf {
    if let Ok(sdk_root) = std::env::var("ANDROID_SDK_ROOT") {
        if !sdk_root.is_empty() {
            return PathBuf::from(sdk_root);
        }
    }
    if let Ok(android_home) = std::env::var("ANDROID_HOME") {
        if !android_home.is_empty() {
            return PathBuf::from(android_home);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("android")
}

/// Move an SDK root whose path contains whitespace on Windows
///
/// The `sdkmanager.bat` launcher cannot start from such a directory. The
/// existing directory is renamed in place (no cross-drive move) and the new
/// root returned. Other platforms get the root back unchanged.
pub fn relocate_sdk_root(sdk_root: &Path, platform: Option<HostPlatform>) -> Result<PathBuf> {
    if platform != Some(HostPlatform::Windows) {
        return Ok(sdk_root.to_path_buf());
    }
    let original = sdk_root.to_string_lossy();
    if !original.chars().any(char::is_whitespace) {
        return Ok(sdk_root.to_path_buf());
    }

    let relocated: String = original
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    let relocated = PathBuf::from(relocated);

    if sdk_root.exists() {
        info!("Moving {:?} to {:?}", sdk_root, relocated);
        if let Some(parent) = relocated.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(sdk_root, &relocated)?;
    }

    Ok(relocated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let inputs = ActionInputs::from_lookup(lookup(&[("cmdline-tools-version", "9862592")]))
            .unwrap();

        assert_eq!(inputs.cmdline_tools_version.as_str(), "9862592");
        assert!(inputs.accept_licenses);
        assert!(inputs.log_accepted_licenses);
        assert!(!inputs.cache);
        assert_eq!(inputs.packages.as_slice(), &["tools", "platform-tools"]);
    }

    #[test]
    fn test_missing_version() {
        let err = ActionInputs::from_lookup(lookup(&[("cache", "true")])).unwrap_err();
        assert!(matches!(err, SetupError::MissingInput(_)));
    }

    #[test]
    fn test_version_with_separator_rejected() {
        let err = ActionInputs::from_lookup(lookup(&[("cmdline-tools-version", "a/b")]))
            .unwrap_err();
        assert!(matches!(err, SetupError::InvalidInput { .. }));

        assert!(ReleaseId::parse("a\\b").is_err());
        assert!(ReleaseId::parse("..").is_err());
        assert!(ReleaseId::parse(" 11076708 ").is_ok());
    }

    #[test]
    fn test_boolean_inputs() {
        let inputs = ActionInputs::from_lookup(lookup(&[
            ("cmdline-tools-version", "11076708"),
            ("accept-android-sdk-licenses", "FALSE"),
            ("log-accepted-android-sdk-licenses", "False"),
            ("cache", "true"),
        ]))
        .unwrap();
        assert!(!inputs.accept_licenses);
        assert!(!inputs.log_accepted_licenses);
        assert!(inputs.cache);

        let err = ActionInputs::from_lookup(lookup(&[
            ("cmdline-tools-version", "11076708"),
            ("cache", "yes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SetupError::InvalidInput { ref name, .. } if name == "cache"));
    }

    #[test]
    fn test_package_parsing() {
        let packages = PackageSet::parse("  platforms;android-30 \n build-tools;30.0.3   emulator ");
        assert_eq!(
            packages.as_slice(),
            &["platforms;android-30", "build-tools;30.0.3", "emulator"]
        );

        let packages = PackageSet::from(vec![" tools ".to_string(), "".to_string()]);
        assert_eq!(packages.as_slice(), &["tools"]);
        assert!(PackageSet::parse("   ").is_empty());
    }

    #[test]
    fn test_input_env_name() {
        assert_eq!(
            input_env_name("cmdline-tools-version"),
            "INPUT_CMDLINE-TOOLS-VERSION"
        );
        assert_eq!(input_env_name("my input"), "INPUT_MY_INPUT");
    }

    #[test]
    fn test_relocation_only_on_windows() {
        let root = Path::new("/opt/android sdk");
        assert_eq!(
            relocate_sdk_root(root, Some(HostPlatform::Linux)).unwrap(),
            root.to_path_buf()
        );
    }

    #[test]
    fn test_relocation_moves_directory() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("Program Files").join("android sdk");
        std::fs::create_dir_all(root.join("platform-tools")).unwrap();

        let relocated = relocate_sdk_root(&root, Some(HostPlatform::Windows)).unwrap();

        assert!(!relocated.to_string_lossy().contains(' '));
        assert!(relocated.join("platform-tools").exists());
        assert!(!root.exists());
    }
}
