//! The setup command
//!
//! Runs the provisioning steps in order: locate or install the command-line
//! tools, restore the cache, accept licenses, install packages, save the
//! cache and export the environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use setup_android_core::config::{relocate_sdk_root, resolve_sdk_root};
use setup_android_core::{ActionInputs, HostPlatform, WorkflowCommands};
use setup_android_toolchain::{
    version, CacheCoordinator, CacheKey, EnvironmentConfig, HttpFetcher, LocalArchiveCache,
    SdkManager, SdkManagerError, ToolchainInstaller, CONNECT_TIMEOUT_SECS,
};

/// What a successful run provisioned
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub sdkmanager: PathBuf,
    pub version: String,
    pub cache_key: Option<CacheKey>,
}

/// Setup command options
pub struct SetupCommand {
    pub inputs: ActionInputs,
    pub sdk_root: PathBuf,
    pub installer: ToolchainInstaller,
    pub cache: CacheCoordinator,
    pub workflow: WorkflowCommands,
}

impl SetupCommand {
    /// Build the command from the runner environment
    ///
    /// The SDK root is resolved and, where needed, relocated here, before
    /// anything else looks at it.
    pub fn from_env() -> Result<Self> {
        let inputs = ActionInputs::from_env()?;
        let platform = HostPlatform::current();

        let sdk_root = relocate_sdk_root(&resolve_sdk_root(), platform)
            .context("Failed to relocate the Android SDK root")?;

        let fetcher = HttpFetcher::new(Duration::from_secs(CONNECT_TIMEOUT_SECS))?;
        let installer = ToolchainInstaller::new(Arc::new(fetcher), platform);

        let cache = if inputs.cache {
            let backend = LocalArchiveCache::new(
                LocalArchiveCache::default_cache_dir(),
                sdk_root.clone(),
            );
            CacheCoordinator::new(Box::new(backend), sdk_root.clone())
        } else {
            CacheCoordinator::disabled(sdk_root.clone())
        };

        Ok(Self {
            inputs,
            sdk_root,
            installer,
            cache,
            workflow: WorkflowCommands::from_env(),
        })
    }

    /// Execute the setup
    pub async fn execute(&self) -> Result<SetupOutcome> {
        let release = &self.inputs.cmdline_tools_version;
        let version = version::resolve(release.as_str());
        info!(
            "Setting up command-line tools {} ({}) in {:?}",
            version, release, self.sdk_root
        );

        let sdkmanager = self
            .installer
            .ensure(&self.sdk_root, version, release)
            .await
            .with_context(|| format!("Failed to install command-line tools {}", release))?;

        let cache_key = self.cache.restore(release, &self.inputs.packages).await;

        let manager = SdkManager::new(self.sdk_root.clone(), sdkmanager.clone());
        let applied = self.apply_packages(&manager).await;

        // Saved even after a failed package. Such an entry stays partial, since keys
        // are never overwritten, and later runs re-install whatever it lacks.
        self.cache.save(cache_key.as_ref()).await;
        applied?;

        EnvironmentConfig::new(&self.sdk_root, &sdkmanager, release)
            .export(&self.workflow)
            .context("Failed to export the Android SDK environment")?;

        Ok(SetupOutcome {
            sdkmanager,
            version: version.to_string(),
            cache_key,
        })
    }

    async fn apply_packages(&self, manager: &SdkManager) -> Result<(), SdkManagerError> {
        if self.inputs.accept_licenses {
            manager
                .accept_licenses(self.inputs.log_accepted_licenses)
                .await?;
        }
        manager.install_packages(&self.inputs.packages).await
    }
}
