//! Result and error types for uiprobe.

use thiserror::Error;

/// Result type for uiprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No button with the requested text appeared before the deadline
    #[error("The button with the text \"{text}\" is not found.")]
    ButtonNotFound {
        /// Button text that was searched for
        text: String,
    },

    /// The button was found but is disabled
    #[error("The button with the text \"{text}\" is not enabled.")]
    ButtonNotEnabled {
        /// Button text that was searched for
        text: String,
    },

    /// The button was found but is not showing on screen
    #[error("The button with the text \"{text}\" is not visible!")]
    ButtonNotVisible {
        /// Button text that was searched for
        text: String,
    },

    /// Commander arguments are missing or malformed
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// No commander registered under the given name
    #[error("Unknown command: {name}")]
    UnknownCommand {
        /// Command name
        name: String,
    },

    /// The UI event thread could not run a job
    #[error("UI dispatch failed: {message}")]
    DispatchFailed {
        /// Error message
        message: String,
    },

    /// A widget refused an action
    #[error("Action failed: {message}")]
    ActionFailed {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a dispatch error
    #[must_use]
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::DispatchFailed {
            message: message.into(),
        }
    }

    /// Create an action error
    #[must_use]
    pub fn action(message: impl Into<String>) -> Self {
        Self::ActionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means the test failed, as opposed to the harness
    /// itself breaking.
    #[must_use]
    pub const fn is_test_failure(&self) -> bool {
        matches!(
            self,
            Self::ButtonNotFound { .. }
                | Self::ButtonNotEnabled { .. }
                | Self::ButtonNotVisible { .. }
        )
    }
}
