//! Error types
//!
//! Failures that callers need to tell apart. Functional test failures are not
//! errors: a test case that runs and fails is a `false` result.

use std::io;
use thiserror::Error;

/// Errors raised by discovery, provisioning, compilation and process launch
#[derive(Error, Debug)]
pub enum XltError {
    /// Missing or invalid arguments, detected before any process is spawned
    #[error("{0}")]
    Configuration(String),

    /// A prerequisite (XLT installation, sources directory, Java) is absent
    #[error("{0}")]
    Environment(String),

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{target} did not finish within {secs} seconds")]
    Timeout { target: String, secs: u64 },

    #[error("Compilation failed: {0}")]
    Compilation(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl XltError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        XltError::Configuration(msg.into())
    }

    pub fn environment(msg: impl Into<String>) -> Self {
        XltError::Environment(msg.into())
    }
}

pub type XltResult<T> = std::result::Result<T, XltError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = XltError::configuration("No pattern given.");
        assert_eq!(err.to_string(), "No pattern given.");

        let err = XltError::Timeout {
            target: "tests.TSearch".to_string(),
            secs: 5,
        };
        assert_eq!(err.to_string(), "tests.TSearch did not finish within 5 seconds");
    }
}
