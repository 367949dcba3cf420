//! setup-android - Android SDK command-line tools for CI jobs
//!
//! Installs the requested release of the Android SDK command-line tools,
//! accepts the SDK licenses, installs SDK packages and exports the SDK
//! location to the following workflow steps.
//!
//! ## Architecture
//!
//! - `setup-android-core`: action inputs, errors and workflow commands
//! - `setup-android-toolchain`: version resolution, installation, caching
//!   and sdkmanager invocation

#![warn(clippy::all)]

pub mod commands;

pub use setup_android_core as core;
pub use setup_android_toolchain as toolchain;

pub use commands::{SetupCommand, SetupOutcome};
