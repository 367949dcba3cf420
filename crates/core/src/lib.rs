//! setup-android core - inputs, errors and runner plumbing
//!
//! This crate holds what every step of the run shares: the validated
//! action inputs, the SDK root resolution, host platform detection and the
//! GitHub Actions workflow commands used to hand state to later steps.

pub mod actions;
pub mod config;
pub mod error;
pub mod platform;

pub use actions::WorkflowCommands;
pub use config::{ActionInputs, PackageSet, ReleaseId};
pub use error::{Result, SetupError};
pub use platform::HostPlatform;

/// setup-android version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
