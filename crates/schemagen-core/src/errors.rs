//! Error types for the schemagen core library.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Top-level error enum for the schemagen core library.
#[derive(Debug, thiserror::Error)]
pub enum SchemaGenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Schema error in {}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("Patch error in {}: {source}", .path.display())]
    Patch {
        path: PathBuf,
        #[source]
        source: PatchError,
    },

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("{0}")]
    Batch(BatchFailure),
}

/// Failures raised while building the schema of a single file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("struct {name} is declared more than once")]
    DuplicateRecord { name: String },
}

/// Failures raised by the textual patcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("declaration of struct {record} not found")]
    DeclarationNotFound { record: String },
}

/// One file that could not be processed during a batch run.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: SchemaGenError,
}

/// Every per-file failure of a run, reported together once all files were tried.
#[derive(Debug, Default)]
pub struct BatchFailure {
    pub failures: Vec<FileFailure>,
}

impl BatchFailure {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Flatten into (path, message) pairs for reporting.
    pub fn summaries(&self) -> Vec<FailureSummary> {
        self.failures
            .iter()
            .map(|f| FailureSummary {
                path: f.path.to_string_lossy().replace('\\', "/"),
                message: f.error.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub path: String,
    pub message: String,
}

pub type SchemaGenResult<T> = Result<T, SchemaGenError>;
