use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for FrankenFault filesystem operations.
///
/// Every intercepted operation returns one of these kinds. Errors are
/// `Clone` because the fault filesystem stores a sticky error value and
/// hands out copies of it while deactivated; for the same reason the `Io`
/// variant carries a rendered message rather than a `std::io::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultError {
    /// Generic I/O failure, genuine or injected.
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable description; injected errors say so.
        message: String,
    },

    /// Data corruption: a checksum mismatch or a forced pre-write fault.
    #[error("corruption: {message}")]
    Corruption {
        /// Description carrying both checksums for handoff mismatches.
        message: String,
    },

    /// File or directory does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was probed.
        path: PathBuf,
    },

    /// Operation is not supported by the current backend.
    #[error("unsupported operation")]
    Unsupported,
}

/// Result alias used across the FrankenFault crates.
pub type Result<T, E = FaultError> = std::result::Result<T, E>;

impl FaultError {
    /// Build a generic I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Build a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Build a not-found error for `path`.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// True if this is the not-found kind.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True if this is the corruption kind.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }

    /// True if this is the generic I/O kind.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl From<std::io::Error> for FaultError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: PathBuf::new(),
            }
        } else {
            Self::Io {
                message: err.to_string(),
            }
        }
    }
}
