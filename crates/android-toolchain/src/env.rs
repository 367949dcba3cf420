//! Environment Export
//!
//! Hands the provisioned SDK to later workflow steps: the SDK root
//! variables, the sdkmanager and platform-tools directories on PATH, and the
//! release that was installed as a step output.

use std::path::{Path, PathBuf};
use tracing::info;

use setup_android_core::{ReleaseId, Result, WorkflowCommands};

/// Step output carrying the installed release identifier
pub const OUTPUT_CMDLINE_TOOLS_VERSION: &str = "ANDROID_COMMANDLINE_TOOLS_VERSION";

/// Variables pointing at the SDK root
pub const SDK_ROOT_VARIABLES: &[&str] = &["ANDROID_HOME", "ANDROID_SDK_ROOT"];

/// Environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// ANDROID_HOME / ANDROID_SDK_ROOT
    pub android_home: PathBuf,
    /// Additional PATH entries
    pub path_additions: Vec<PathBuf>,
    /// Installed command-line tools release
    pub release: ReleaseId,
}

impl EnvironmentConfig {
    /// Create from the SDK root and the sdkmanager that was located or installed
    pub fn new(sdk_root: &Path, sdkmanager: &Path, release: &ReleaseId) -> Self {
        let mut path_additions = Vec::new();
        if let Some(bin) = sdkmanager.parent() {
            path_additions.push(bin.to_path_buf());
        }
        path_additions.push(sdk_root.join("platform-tools"));

        Self {
            android_home: sdk_root.to_path_buf(),
            path_additions,
            release: release.clone(),
        }
    }

    /// Write the configuration through the runner's workflow commands
    pub fn export(&self, commands: &WorkflowCommands) -> Result<()> {
        commands.set_output(OUTPUT_CMDLINE_TOOLS_VERSION, self.release.as_str())?;

        let android_home = self.android_home.to_string_lossy();
        for name in SDK_ROOT_VARIABLES {
            commands.export_variable(name, &android_home)?;
        }

        for dir in &self.path_additions {
            commands.add_path(dir)?;
        }

        info!("Exported Android SDK environment for {:?}", self.android_home);
        Ok(())
    }
}
