//! notemd library
//!
//! Post-processing for markdown produced by an external document converter
//! during a note export: converter `<img>` tags become page-owned
//! attachments moved into a resource folder, and converter artifacts
//! (header block, blockquote markers, blank-line runs) are stripped.

pub mod cli;
pub mod config;
pub mod document;
pub mod domain;
pub mod errors;
pub mod export;
pub mod output;
pub mod postprocess;

// Re-export commonly used types
pub use config::{NotemdConfig, PostProcessingConfig};
pub use domain::{AddressingMode, Attachment, AttachmentType, Page};
pub use errors::{PostProcessError, RelocationError};
pub use postprocess::{ImagePass, PostProcessOutcome, PostProcessRequest, PostProcessor};
