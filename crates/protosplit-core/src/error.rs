//! Error types for the protosplit-core library.
//!
//! Errors fall into two groups. Recoverable ones (a malformed mapping row, a
//! key mapped two different ways) are reported and skipped by the batch APIs.
//! Everything else aborts the run before any output is produced.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for protosplit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all protosplit operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to empty an output directory
    #[error("failed to clear directory '{path}': {source}")]
    DirectoryClear {
        /// Path that could not be removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A mapping row without two usable columns
    #[error("malformed mapping record on line {line}: expected 2 non-empty columns, found {columns}")]
    MalformedRecord {
        /// 1-based line number in the mapping input
        line: usize,
        /// Number of usable columns found
        columns: usize,
    },

    /// An obfuscated key mapped to more than one clear value
    #[error("obfuscated key '{key}' occurs {occurrences} times with inconsistent values")]
    InconsistentMapping {
        /// The obfuscated key
        key: String,
        /// How many records carried the key
        occurrences: usize,
    },

    /// A closing line with no open nesting construct
    #[error("unbalanced closing brace on schema line {line}: no open block to close")]
    UnbalancedNesting {
        /// 1-based line number in the schema input
        line: usize,
    },

    /// An input stream failed mid-read
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// A configured regular expression did not compile
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The configuration file is not valid TOML for [`Config`](crate::Config)
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The blacklist file is not a JSON object
    #[error("failed to parse blacklist: {0}")]
    BlacklistParse(#[from] serde_json::Error),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory clearing error
    pub fn directory_clear(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryClear {
            path: path.into(),
            source,
        }
    }

    /// Creates a new malformed record error
    pub fn malformed_record(line: usize, columns: usize) -> Self {
        Self::MalformedRecord { line, columns }
    }

    /// Creates a new inconsistent mapping error
    pub fn inconsistent_mapping(key: impl Into<String>, occurrences: usize) -> Self {
        Self::InconsistentMapping {
            key: key.into(),
            occurrences,
        }
    }

    /// Creates a new unbalanced nesting error
    pub fn unbalanced_nesting(line: usize) -> Self {
        Self::UnbalancedNesting { line }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a recoverable error that should be skipped
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. } | Self::InconsistentMapping { .. }
        )
    }
}
