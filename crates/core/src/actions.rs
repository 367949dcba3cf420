//! GitHub Actions workflow commands
//!
//! Exports variables, PATH entries and outputs through the runner's file
//! commands (`GITHUB_ENV`, `GITHUB_PATH`, `GITHUB_OUTPUT`) and prints the
//! stdout log directives used for groups and annotations.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;

/// Handle on the runner's file commands
#[derive(Debug, Clone, Default)]
pub struct WorkflowCommands {
    env_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl WorkflowCommands {
    /// Pick up the command files from the runner environment
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            env_file: file("GITHUB_ENV"),
            path_file: file("GITHUB_PATH"),
            output_file: file("GITHUB_OUTPUT"),
        }
    }

    /// Use explicit command files
    pub fn with_files(env_file: PathBuf, path_file: PathBuf, output_file: PathBuf) -> Self {
        Self {
            env_file: Some(env_file),
            path_file: Some(path_file),
            output_file: Some(output_file),
        }
    }

    /// Export a variable to later steps and to this process
    pub fn export_variable(&self, name: &str, value: &str) -> Result<()> {
        std::env::set_var(name, value);
        match &self.env_file {
            Some(file) => append(file, &key_value_message(name, value)),
            None => {
                info!("{}={}", name, value);
                Ok(())
            }
        }
    }

    /// Prepend a directory to PATH for later steps and for this process
    pub fn add_path(&self, dir: &Path) -> Result<()> {
        let mut entries = vec![dir.to_path_buf()];
        if let Some(current) = std::env::var_os("PATH") {
            entries.extend(std::env::split_paths(&current));
        }
        match std::env::join_paths(entries) {
            Ok(joined) => std::env::set_var("PATH", joined),
            Err(e) => warn!("Could not add {:?} to this process's PATH: {}", dir, e),
        }

        match &self.path_file {
            Some(file) => append(file, &format!("{}\n", dir.display())),
            None => {
                info!("Added {:?} to PATH", dir);
                Ok(())
            }
        }
    }

    /// Set a step output
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        match &self.output_file {
            Some(file) => append(file, &key_value_message(name, value)),
            None => {
                info!("Output {}={}", name, value);
                Ok(())
            }
        }
    }
}

fn append(file: &Path, message: &str) -> Result<()> {
    debug!("Writing workflow command to {:?}", file);
    let mut handle = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)?;
    handle.write_all(message.as_bytes())?;
    Ok(())
}

/// Render `name=value`, switching to the heredoc form for multi-line values
fn key_value_message(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{}={}\n", name, value);
    }
    let mut delimiter = String::from("ghadelimiter");
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
}

/// Start a collapsible log group
pub fn start_group(name: &str) {
    println!("::group::{}", name);
}

/// Close the current log group
pub fn end_group() {
    println!("::endgroup::");
}

/// Emit a warning annotation
pub fn warning(message: &str) {
    println!("::warning::{}", escape_data(message));
}

/// Emit an error annotation
pub fn error(message: &str) {
    println!("::error::{}", escape_data(message));
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_message() {
        assert_eq!(key_value_message("A", "b"), "A=b\n");
        assert_eq!(
            key_value_message("A", "line1\nline2"),
            "A<<ghadelimiter\nline1\nline2\nghadelimiter\n"
        );
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
    }

    #[test]
    fn test_file_commands() {
        let dir = tempfile::tempdir().unwrap();
        let commands = WorkflowCommands::with_files(
            dir.path().join("env"),
            dir.path().join("path"),
            dir.path().join("output"),
        );

        commands
            .export_variable("SETUP_ANDROID_TEST_VAR", "/sdk")
            .unwrap();
        commands.set_output("ANDROID_COMMANDLINE_TOOLS_VERSION", "9862592").unwrap();
        commands.set_output("OTHER", "x").unwrap();

        let env = std::fs::read_to_string(dir.path().join("env")).unwrap();
        assert_eq!(env, "SETUP_ANDROID_TEST_VAR=/sdk\n");
        assert_eq!(std::env::var("SETUP_ANDROID_TEST_VAR").unwrap(), "/sdk");

        let output = std::fs::read_to_string(dir.path().join("output")).unwrap();
        assert_eq!(output, "ANDROID_COMMANDLINE_TOOLS_VERSION=9862592\nOTHER=x\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_add_path_with_unjoinable_entry() {
        let dir = tempfile::tempdir().unwrap();
        let commands = WorkflowCommands::with_files(
            dir.path().join("env"),
            dir.path().join("path"),
            dir.path().join("output"),
        );
        let before = std::env::var_os("PATH");

        // ':' cannot appear inside a PATH entry
        commands.add_path(Path::new("/opt/sdk:bin")).unwrap();

        assert_eq!(std::env::var_os("PATH"), before);
        let path = std::fs::read_to_string(dir.path().join("path")).unwrap();
        assert_eq!(path, "/opt/sdk:bin\n");
    }
}
