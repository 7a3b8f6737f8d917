//! Attachment file relocation
//!
//! Moves the files the converter extracted into the export's resource
//! folder once every reference in the document has been rewritten.

use crate::domain::Attachment;
use crate::errors::RelocationError;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A relocation that did not happen
#[derive(Debug)]
pub struct RelocationFailure {
    pub attachment_id: String,
    pub error: RelocationError,
}

/// What happened to each attachment handed to [`relocate_attachments`]
#[derive(Debug, Default)]
pub struct RelocationReport {
    /// Destination paths of the files that were moved
    pub moved: Vec<PathBuf>,
    pub failed: Vec<RelocationFailure>,
}

impl RelocationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Serializable summary for CLI output
    pub fn summary(&self) -> RelocationSummary {
        RelocationSummary {
            moved: self.moved.len(),
            failed: self
                .failed
                .iter()
                .map(|f| format!("{}: {}", f.attachment_id, f.error))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelocationSummary {
    pub moved: usize,
    pub failed: Vec<String>,
}

/// Move each attachment's source file to its export path.
///
/// Relative source paths are resolved against `source_root`, the
/// converter's working directory. Existing destinations are never
/// overwritten. Each failure is logged and recorded; the remaining
/// attachments are still processed.
pub fn relocate_attachments(attachments: &[Attachment], source_root: &Path) -> RelocationReport {
    let mut report = RelocationReport::default();

    for attachment in attachments {
        match relocate_one(attachment, source_root) {
            Ok(()) => {
                debug!(
                    id = attachment.id(),
                    to = %attachment.export_path().display(),
                    "Moved attachment"
                );
                report.moved.push(attachment.export_path().to_path_buf());
            }
            Err(error) => {
                warn!(
                    id = attachment.id(),
                    src = attachment.source_path(),
                    "Attachment not relocated: {}",
                    error
                );
                report.failed.push(RelocationFailure {
                    attachment_id: attachment.id().to_string(),
                    error,
                });
            }
        }
    }

    report
}

/// Resolve a converter-emitted `src` value against the converter's working directory
pub fn resolve_source(source_path: &str, source_root: &Path) -> PathBuf {
    let path = Path::new(source_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        source_root.join(path)
    }
}

fn relocate_one(attachment: &Attachment, source_root: &Path) -> Result<(), RelocationError> {
    let source = resolve_source(attachment.source_path(), source_root);
    let destination = attachment.export_path();

    if !source.is_file() {
        return Err(RelocationError::SourceMissing { path: source });
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| RelocationError::io(parent, e))?;
        }
    }

    let mut reader = fs::File::open(&source).map_err(|e| RelocationError::io(&source, e))?;
    write_new(&mut reader, destination)?;
    drop(reader);

    fs::remove_file(&source).map_err(|e| RelocationError::io(&source, e))
}

/// Copy `reader` into a file that must not exist yet.
///
/// A copy that fails partway removes the partial destination again.
fn write_new(reader: &mut impl Read, destination: &Path) -> Result<(), RelocationError> {
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => RelocationError::DestinationExists {
                path: destination.to_path_buf(),
            },
            _ => RelocationError::io(destination, e),
        })?;

    if let Err(e) = io::copy(reader, &mut writer) {
        drop(writer);
        if let Err(cleanup) = fs::remove_file(destination) {
            warn!(
                path = %destination.display(),
                "Partial attachment copy not removed: {}",
                cleanup
            );
        }
        return Err(RelocationError::io(destination, e));
    }
    Ok(())
}
