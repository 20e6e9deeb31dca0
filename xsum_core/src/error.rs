//! Error types for xsum_core.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Result type alias using xsum_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Filesystem operation that failed, used for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Stat,
    Open,
    Read,
    ReadLink,
    ReadDir,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Op::Stat => "stat",
            Op::Open => "open",
            Op::Read => "read",
            Op::ReadLink => "read link",
            Op::ReadDir => "read dir",
        };
        f.write_str(verb)
    }
}

/// Errors produced while hashing a tree.
///
/// Every operational error embeds its path once, at the point of failure.
/// Parents pass child errors through unchanged; only a top-level directory
/// wraps the first child error with its own path ([`Error::Tree`]), so
/// prefixes never stack.
#[derive(Error, Debug)]
pub enum Error {
    /// The path does not exist.
    #[error("`{path}' does not exist")]
    DoesNotExist { path: String },

    /// A filesystem operation on the path failed.
    #[error("failed to {op} `{path}': {source}")]
    Op {
        op: Op,
        path: String,
        source: std::io::Error,
    },

    /// The hash provider reported an error (including plugin failures).
    #[error("failed to hash `{path}': {reason}")]
    Hash { path: String, reason: String },

    /// The path is a device node, FIFO, or socket.
    #[error("failed to hash `{path}': special file")]
    SpecialFile { path: String },

    /// A top-level directory failed because one of its children failed.
    #[error("{path}: {source}")]
    Tree { path: String, source: Box<Error> },

    /// The mask string could not be parsed.
    #[error("invalid mask `{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },

    /// The algorithm name is not in the registry and names no plugin.
    #[error("unsupported algorithm `{algorithm}'")]
    UnsupportedAlgorithm { algorithm: String },

    /// A walker task panicked or was cancelled.
    #[error("walker task failed: {source}")]
    Task {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl Error {
    /// Create an error for a failed stat, mapping NotFound to DoesNotExist.
    pub fn stat(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::DoesNotExist {
                path: path.display().to_string(),
            }
        } else {
            Error::op(Op::Stat, path, source)
        }
    }

    /// Create an error for a failed filesystem operation.
    pub fn op(op: Op, path: &Path, source: std::io::Error) -> Self {
        Error::Op {
            op,
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a hash failure error.
    pub fn hash(path: &Path, source: impl fmt::Display) -> Self {
        Error::Hash {
            path: path.display().to_string(),
            reason: source.to_string(),
        }
    }

    /// Create a special-file error.
    pub fn special(path: &Path) -> Self {
        Error::SpecialFile {
            path: path.display().to_string(),
        }
    }

    /// Wrap a child error with a top-level directory's path.
    pub fn tree(path: &Path, source: Error) -> Self {
        Error::Tree {
            path: path.display().to_string(),
            source: Box::new(source),
        }
    }

    /// Create an InvalidMask error.
    pub fn invalid_mask(mask: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidMask {
            mask: mask.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn stat_maps_not_found() {
        let err = Error::stat(
            Path::new("gone"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.to_string(), "`gone' does not exist");
    }

    #[test]
    fn op_error_names_the_operation() {
        let err = Error::op(
            Op::ReadDir,
            Path::new("d"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "failed to read dir `d': denied");
    }

    #[test]
    fn tree_wrap_prefixes_once() {
        let child = Error::special(Path::new("d/sock"));
        let err = Error::tree(Path::new("d"), child);
        assert_eq!(err.to_string(), "d: failed to hash `d/sock': special file");
    }
}
