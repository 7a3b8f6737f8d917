//! Error types for the post-processing passes.
//!
//! Only the image pass can fail. Text normalization is infallible, and
//! relocation failures are reported per attachment instead of propagated.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the image pass for a single page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostProcessError {
    /// An `<img>` tag was found whose `src` attribute could not be parsed
    #[error("Malformed image tag (no parsable src attribute): {tag}")]
    MalformedImageTag { tag: String },
}

/// Errors raised while moving an attachment to its destination.
#[derive(Debug, Error)]
pub enum RelocationError {
    /// The converter did not emit the referenced file
    #[error("Source file not found: {}", path.display())]
    SourceMissing { path: PathBuf },
    /// Something already lives at the destination path
    #[error("Destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RelocationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
