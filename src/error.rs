use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while reading a log, compiling the policy, or writing reports.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line_number}: line is not valid UTF-8", .path.display())]
    Encoding {
        path: PathBuf,
        line_number: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("invalid pattern {pattern:?} in {scope}: {source}")]
    InvalidPattern {
        scope: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot encode {document} document: {source}")]
    Serialize {
        document: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProcessError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(scope: &str, pattern: &str, source: regex::Error) -> Self {
        ProcessError::InvalidPattern {
            scope: scope.to_string(),
            pattern: pattern.to_string(),
            source,
        }
    }

    /// Encoding failures are skipped and counted; everything else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProcessError::Encoding { .. })
    }
}
