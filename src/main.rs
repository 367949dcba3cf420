//! setup-android entry point
//!
//! Reads the action inputs, provisions the SDK and reports fatal errors as
//! workflow annotations with a non-zero exit status.

use std::process::ExitCode;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use setup_android::core::{actions, SetupError, VERSION};
use setup_android::SetupCommand;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("setup-android v{} starting...", VERSION);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<SetupError>() {
                Some(setup_error) => setup_error.user_message(),
                None => format!("{:#}", e),
            };
            error!("{}", message);
            actions::error(&message);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let command = SetupCommand::from_env()?;
    let outcome = command.execute().await?;

    info!(
        "Android SDK command-line tools {} ready at {:?}",
        outcome.version, outcome.sdkmanager
    );
    Ok(())
}
