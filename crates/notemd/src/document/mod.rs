//! Markdown post-processing building blocks
//!
//! Converter boundary, image extraction with reference rewriting, file
//! relocation, and the text normalization passes. [`crate::postprocess`]
//! sequences them for a page.

mod attachments;
mod converter;
pub mod normalize;
pub mod paths;
mod relocate;

pub use attachments::{resolve_and_rewrite, Rewrite, RewriteTarget};
pub use converter::{
    ConvertedDocument, ConverterRegistry, DocumentConverter, MarkdownPassthrough, PandocConverter,
};
pub use normalize::{normalize, NormalizeOptions};
pub use relocate::{
    relocate_attachments, resolve_source, RelocationFailure, RelocationReport, RelocationSummary,
};
