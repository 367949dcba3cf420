//! SDK Manager
//!
//! Wraps the Android SDK manager to accept licenses and install SDK packages.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use setup_android_core::{actions, PackageSet};

/// Number of `y` answers fed to every sdkmanager invocation
pub const AUTO_ACCEPT_RESPONSES: usize = 10;

/// sdkmanager flag that walks through the license prompts
pub const LICENSES_FLAG: &str = "--licenses";

/// SDK Manager errors
#[derive(Debug, thiserror::Error)]
pub enum SdkManagerError {
    #[error("sdkmanager {argument} failed with exit code {code:?}")]
    CommandFailed { argument: String, code: Option<i32> },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pre-rendered answers for the interactive prompts
pub fn auto_accept_input() -> Vec<u8> {
    b"y\n".repeat(AUTO_ACCEPT_RESPONSES)
}

/// Android SDK Manager wrapper
pub struct SdkManager {
    sdk_root: PathBuf,
    sdkmanager_path: PathBuf,
}

impl SdkManager {
    /// Create a new SDK manager
    pub fn new(sdk_root: PathBuf, sdkmanager_path: PathBuf) -> Self {
        Self {
            sdk_root,
            sdkmanager_path,
        }
    }

    /// Create the base command with environment variables
    fn create_command(&self) -> Command {
        let mut cmd = Command::new(&self.sdkmanager_path);

        cmd.env("ANDROID_SDK_ROOT", &self.sdk_root);
        cmd.env("ANDROID_HOME", &self.sdk_root);

        cmd
    }

    /// Run sdkmanager once with a single argument
    ///
    /// Stdin receives exactly [`AUTO_ACCEPT_RESPONSES`] answers and is then
    /// closed; prompts beyond that see end of input.
    pub async fn apply(&self, argument: &str, quiet: bool) -> Result<(), SdkManagerError> {
        debug!("Running {:?} {}", self.sdkmanager_path, argument);

        let output = || if quiet { Stdio::null() } else { Stdio::inherit() };
        let mut child = self.create_command()
            .arg(argument)
            .stdin(Stdio::piped())
            .stdout(output())
            .stderr(output())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&auto_accept_input()).await {
                Ok(()) => {}
                // sdkmanager exited without reading its answers
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let status = child.wait().await?;

        if !status.success() {
            return Err(SdkManagerError::CommandFailed {
                argument: argument.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }

    /// Accept all licenses
    pub async fn accept_licenses(&self, log_output: bool) -> Result<(), SdkManagerError> {
        info!("Accepting Android SDK licenses...");

        actions::start_group("Accepting Android SDK licenses");
        let result = self.apply(LICENSES_FLAG, !log_output).await;
        actions::end_group();
        result?;

        info!("Licenses accepted");
        Ok(())
    }

    /// Install packages one sdkmanager call at a time, in request order
    pub async fn install_packages(&self, packages: &PackageSet) -> Result<(), SdkManagerError> {
        for package in packages.iter() {
            info!("Installing {}", package);

            actions::start_group(&format!("Installing {}", package));
            let result = self.apply(package, false).await;
            actions::end_group();
            result?;
        }

        info!("Installed {} SDK package(s)", packages.len());
        Ok(())
    }

    /// Get the SDK root path
    pub fn sdk_root(&self) -> &Path {
        &self.sdk_root
    }

    /// Get the sdkmanager path
    pub fn sdkmanager_path(&self) -> &Path {
        &self.sdkmanager_path
    }
}
