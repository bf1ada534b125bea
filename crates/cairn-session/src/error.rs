//! Error types for session store operations.

use std::path::PathBuf;

/// Error type for session store operations.
///
/// Absence is never an error: a missing session is `Ok(None)` from
/// [`load`](crate::NamespaceStore::load) and `Ok(false)` from
/// [`delete`](crate::NamespaceStore::delete).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying filesystem operation failed for a reason other than absence.
    #[error("failed to {op} '{}': {source}", path.display())]
    Persistence {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not a well-formed cache entry.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// The payload could not be serialized.
    #[error("failed to encode record: {0}")]
    Encode(String),
}

impl Error {
    pub(crate) fn persistence(
        op: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Persistence {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a decode failure rather than an I/O failure.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptRecord(_))
    }
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
