//! Host platform detection

use std::fmt;

/// Operating systems the command-line tools are published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPlatform {
    Linux,
    Mac,
    Windows,
}

impl HostPlatform {
    /// Platform of the running process, if supported
    pub fn current() -> Option<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a Rust `target_os` name to a supported platform
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(HostPlatform::Linux),
            "macos" => Some(HostPlatform::Mac),
            "windows" => Some(HostPlatform::Windows),
            _ => None,
        }
    }

    /// Tag used in the command-line tools archive name
    pub fn archive_tag(&self) -> &'static str {
        match self {
            HostPlatform::Linux => "linux",
            HostPlatform::Mac => "mac",
            HostPlatform::Windows => "win",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostPlatform::Linux => "linux",
            HostPlatform::Mac => "macos",
            HostPlatform::Windows => "windows",
        };
        f.write_str(name)
    }
}

/// SDK manager launcher name for the running process
pub fn sdkmanager_exe() -> &'static str {
    if cfg!(windows) {
        "sdkmanager.bat"
    } else {
        "sdkmanager"
    }
}
