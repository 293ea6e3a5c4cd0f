use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the library.  Nothing is recovered internally: every
/// lookup, read or interpolation either succeeds or returns one of these.
#[derive(Debug, Error)]
pub enum SpexError {
    /// The persisted index is missing or cannot be parsed.
    #[error("spectral index unavailable at {}: {reason}", path.display())]
    IndexUnavailable { path: PathBuf, reason: String },

    /// Forward lookup miss.
    #[error("unknown spectral type '{0}'")]
    UnknownSpectralType(String),

    /// Reverse lookup miss: the filename is not listed under any type.
    #[error("filename '{0}' is not listed under any spectral type")]
    UnknownFilename(String),

    #[error("cannot open spectrum file {}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container opened but its contents are not a usable block.
    #[error("malformed spectrum container {}: {reason}", path.display())]
    MalformedContainer { path: PathBuf, reason: String },

    /// Interpolation needs `x_len == y_len >= 2`.
    #[error("interpolation needs at least 2 paired samples, got x={x_len} y={y_len}")]
    InsufficientPoints { x_len: usize, y_len: usize },
}

pub type Result<T> = std::result::Result<T, SpexError>;

impl SpexError {
    /// Shorthand for a [`SpexError::MalformedContainer`] built from any
    /// displayable reason (anyhow chains are rendered with `{:#}`).
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        SpexError::MalformedContainer {
            path: path.into(),
            reason: format!("{reason:#}"),
        }
    }
}
