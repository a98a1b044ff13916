use std::fmt;
use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Flat error taxonomy. `lookup_miss` deliberately has no variant here: a
/// missed lookup is never an error, it is encoded as a partial
/// [`crate::frame::ResolvedFrame`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    PlainIo(#[from] std::io::Error),

    #[error("malformed object or debug data: {0}")]
    Format(String),

    #[error("unsupported feature: {0}")]
    Unsupported(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl Error {
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    pub fn internal(msg: impl fmt::Display) -> Self {
        Error::Internal(msg.to_string())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error reflects a condition the resolver can continue
    /// past by degrading the affected PC(s) to partial frames, as opposed to
    /// one that should poison the whole resolver.
    pub fn is_recoverable_per_pc(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }
}

impl From<goblin::error::Error> for Error {
    fn from(e: goblin::error::Error) -> Self {
        Error::Format(e.to_string())
    }
}

impl From<gimli::read::Error> for Error {
    fn from(e: gimli::read::Error) -> Self {
        Error::Format(e.to_string())
    }
}
