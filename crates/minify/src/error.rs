//! Minification error types.

use std::time::Duration;

use squash_throttle::InvalidArgument;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("minimizer '{name}' failed: {message}")]
    Minimizer { name: String, message: String },

    #[error("unknown minimizer: {0}")]
    UnknownMinimizer(String),

    #[error("minimizer '{0}' is already registered")]
    DuplicateMinimizer(String),

    #[error("minimizer input contains no asset")]
    EmptyInput,

    #[error("options error: {0}")]
    Options(#[from] serde_json::Error),

    #[error("external minifier failed: {0}")]
    Process(String),

    #[error("external minifier timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MinifyError {
    pub fn minimizer(name: impl Into<String>, message: impl Into<String>) -> Self {
        MinifyError::Minimizer {
            name: name.into(),
            message: message.into(),
        }
    }
}
