//! Error types surfaced by the public API.
//!
//! Only document-level and I/O failures ever reach a caller. Per-rule
//! structural problems are absorbed by the document parser (counted and
//! logged), and evaluation-time problems degrade to empty text.

use std::path::PathBuf;

/// Errors returned by [`crate::Kernel`] and the free-standing parse functions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The markup itself is broken (unbalanced tags, bad entity, ...). The
    /// whole document is rejected; other documents are unaffected.
    #[error("{origin}:{line}:{column}: malformed document: {message}")]
    Malformed { origin: String, line: usize, column: usize, message: String },

    #[error("invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("failed to encode brain: {0}")]
    BrainEncode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode brain: {0}")]
    BrainDecode(#[from] rmp_serde::decode::Error),

    #[error("not a brain file (expected format {expected}, found {found:?})")]
    BrainFormat { expected: u32, found: Option<u32> },

    #[error("invalid substitution tables in {origin}: {message}")]
    Substitutions { origin: String, message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
