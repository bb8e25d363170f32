//! Error types for the merge engine.

use thiserror::Error;

/// All possible errors from the merge engine.
///
/// "Nothing to do" is never an error; it is reported as
/// [`MergeResult::Unchanged`](crate::MergeResult::Unchanged).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The installed file is malformed or lacks the shape the profile requires.
    #[error("unparsable target {file}: {reason}")]
    UnparsableTarget { file: String, reason: String },

    /// The fragment shipped with the mod is malformed or of the wrong kind.
    #[error("unreadable source for {file}: {reason}")]
    UnreadableSource { file: String, reason: String },

    #[error("failed to serialize {file}: {reason}")]
    Serialize { file: String, reason: String },
}

impl Error {
    pub(crate) fn unparsable_target(file: &str, reason: impl ToString) -> Self {
        Error::UnparsableTarget {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unreadable_source(file: &str, reason: impl ToString) -> Self {
        Error::UnreadableSource {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn serialization(file: &str, reason: impl ToString) -> Self {
        Error::Serialize {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Name of the file the error refers to.
    pub fn file(&self) -> &str {
        match self {
            Error::UnparsableTarget { file, .. }
            | Error::UnreadableSource { file, .. }
            | Error::Serialize { file, .. } => file,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
