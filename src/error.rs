use std::path::PathBuf;
use std::time::Duration;

/// The primary error type for all operations in the `archcrack` crate.
///
/// Only conditions the caller must act on are errors. An unrecognised archive
/// degrades to [`ArchiveKind::Unknown`](crate::common::ArchiveKind::Unknown),
/// an exhausted dictionary is a normal [`CrackOutcome`](crate::crack::CrackOutcome),
/// and a failed extraction is reported through
/// [`ExtractionResult`](crate::extract::ExtractionResult).
#[derive(Debug, thiserror::Error)]
pub enum CrackError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    /// No usable archive tool binary could be located.
    #[error("archive tool not found: {0}")]
    ToolNotFound(String),

    /// The archive tool could not be started or waited on.
    #[error("failed to run archive tool '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// A large dictionary file did not finish reading within its time budget.
    #[error("timed out after {}s reading dictionary '{}'", timeout.as_secs(), path.display())]
    DictionaryTimeout { path: PathBuf, timeout: Duration },

    /// The file is not an archive format the tool is driven for.
    #[error("unsupported archive format: {}", .0.display())]
    Unsupported(PathBuf),

    /// A configuration value (CLI flag or environment variable) is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A background task panicked or was cancelled unexpectedly.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CrackError {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CrackError::Io {
            source,
            path: path.into(),
        }
    }
}

pub type Result<T, E = CrackError> = std::result::Result<T, E>;
