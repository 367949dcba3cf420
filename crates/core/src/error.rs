//! Error types for setup-android
//!
//! Configuration problems detected before any toolchain work starts.

use thiserror::Error;

/// Errors raised while reading and validating the action configuration
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    #[error("Invalid value for input '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, SetupError>;

impl SetupError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        SetupError::InvalidInput {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SetupError::MissingInput(name) => {
                format!("The '{}' input must be set in the workflow step", name)
            }
            SetupError::InvalidInput { name, reason } => {
                format!("Configuration error in '{}': {}", name, reason)
            }
            SetupError::Io(e) => format!("File operation failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_input() {
        let err = SetupError::invalid("cache", "expected a boolean");
        assert!(err.user_message().contains("cache"));
        assert!(err.to_string().contains("expected a boolean"));
    }
}
