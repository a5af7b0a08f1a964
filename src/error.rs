//! Error taxonomy for coverage extraction
//!
//! Fatal conditions (missing counter files, failing external tools) unwind
//! straight out of the pipeline. Malformed report lines never reach this type;
//! the report parser absorbs them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating or extracting coverage
#[derive(Error, Debug)]
pub enum CoverageError {
    /// Invalid combination of caller-supplied inputs
    #[error("Usage error: {0}")]
    Usage(String),

    /// A required counter file, profile or report could not be located
    #[error("Missing {kind}: {}", .path.display())]
    MissingArtifact { kind: &'static str, path: PathBuf },

    /// An external tool ran to completion but returned a nonzero status
    #[error("{tool} failed with exit code {exit_code}")]
    ExternalToolFailure { tool: String, exit_code: i32 },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoverageError {
    /// Process exit code for this error
    ///
    /// External tool codes propagate verbatim so callers see the first
    /// failing tool's status.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoverageError::ExternalToolFailure { exit_code, .. } => *exit_code,
            CoverageError::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// Result type for coverage operations
pub type Result<T> = std::result::Result<T, CoverageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_code_propagates() {
        let err = CoverageError::ExternalToolFailure {
            tool: "grcov".to_string(),
            exit_code: 101,
        };
        assert_eq!(err.exit_code(), 101);
        assert_eq!(err.to_string(), "grcov failed with exit code 101");
    }

    #[test]
    fn test_usage_exit_code() {
        assert_eq!(CoverageError::Usage("bad".into()).exit_code(), 2);
    }

    #[test]
    fn test_missing_artifact_message() {
        let err = CoverageError::MissingArtifact {
            kind: "data file",
            path: PathBuf::from("/tmp/bin/foo.gcda"),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("foo.gcda"));
        assert!(err.to_string().starts_with("Missing data file"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoverageError = io.into();
        assert!(matches!(err, CoverageError::Io(_)));
    }
}
