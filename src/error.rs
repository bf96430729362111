//! Error types for the filter engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// A required argument was empty (e.g. a source name)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The lines of a source could not be turned into a valid pattern
    #[error("Failed to compile source '{source_name}': {message}")]
    Compile { source_name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A load call finished without registering a single source
    #[error("No source could be loaded")]
    NoSourceLoaded,
}

impl FilterError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn compile(source_name: &str, err: impl std::fmt::Display) -> Self {
        Self::Compile {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
