//! Error taxonomy for guarded file and command execution.

use thiserror::Error;

/// Failures raised by the policy, the path guard and the executors.
///
/// Every variant is fatal to the single action that triggered it and is
/// converted into a result line by the action executor.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The command's leading token is not on the allow-list.
    #[error("Command '{command}' is not in the allowed commands list for security reasons")]
    PolicyViolation { command: String },

    #[error("Command is required")]
    EmptyCommand,

    /// The resolved path lies outside the sandbox root.
    #[error("File operations are only allowed within the current project directory: {path}")]
    OutOfScope { path: String },

    /// The resolved path contains a denylisted substring.
    #[error("File operations on paths matching '{pattern}' are not allowed for security reasons: {path}")]
    DeniedPath { path: String, pattern: String },

    /// An action record lacks a required, non-empty field.
    #[error("Missing {fields} for {action}")]
    MissingParameter {
        action: &'static str,
        fields: &'static str,
    },

    /// The edit target does not contain the old string.
    #[error("Failed to edit file {path}: old string not found in file content")]
    NotFound { path: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        EngineError::Io {
            context: context.into(),
            source,
        }
    }
}
