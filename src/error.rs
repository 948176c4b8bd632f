//! ToolGuard error types

use thiserror::Error;

/// ToolGuard error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Detector launch or protocol failure
    #[error("Detector error: {0}")]
    Detector(String),

    /// A scan job could not be dispatched
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Tool lookup or execution error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Missing or mistyped tool argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an IO error with the path it occurred on.
    pub fn io_at(path: &std::path::Path, err: std::io::Error) -> Self {
        Error::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }
}

/// Result type alias for ToolGuard operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_at_includes_path() {
        let err = Error::io_at(
            std::path::Path::new("/nope/file.txt"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/nope/file.txt"));
        assert!(msg.starts_with("IO error"));
    }
}
