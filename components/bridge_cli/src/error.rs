//! Error types for the CLI

use bindings::BindingError;

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Setting up or using the context failed
    #[error("bindings error: {0}")]
    Binding(#[from] BindingError),

    /// Output could not be serialized
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
