//! Core domain types for page export.
//!
//! A [`Page`] is one note being exported and owns the [`Attachment`]s that
//! its markdown references. Attachments are only ever appended to a page, and
//! only by the image pass in [`crate::document`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Kind of embedded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    /// Inline image extracted by the converter
    Image,
}

/// How rewritten references address an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// Store-internal reference by identifier (`:/<id>`)
    Absolute,
    /// Filesystem path relative to the markdown file's directory
    #[default]
    Relative,
}

impl AddressingMode {
    /// Map the boolean "absolute attachment reference" setting to a mode
    pub fn from_absolute(absolute: bool) -> Self {
        if absolute {
            Self::Absolute
        } else {
            Self::Relative
        }
    }
}

/// An embedded resource registered on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    id: String,
    kind: AttachmentType,
    source_path: String,
    file_name: String,
    export_path: PathBuf,
}

impl Attachment {
    /// Create a new image attachment for a converter-emitted source path.
    ///
    /// Assigns a fresh identifier (a v4 UUID without dashes) and derives the
    /// output file name from it plus the source file's extension.
    pub fn new_image(source_path: &str, resource_folder: &Path) -> Self {
        let id = new_attachment_id();
        let file_name = match Path::new(source_path).extension() {
            Some(ext) => format!("{}.{}", id, ext.to_string_lossy()),
            None => id.clone(),
        };
        let export_path = resource_folder.join(&file_name);

        Self {
            id,
            kind: AttachmentType::Image,
            source_path: source_path.to_string(),
            file_name,
            export_path,
        }
    }

    /// Opaque identifier (32 lowercase hex characters)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> AttachmentType {
        self.kind
    }

    /// Path as emitted by the converter in the `src` attribute
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Output file name (`<id><ext>`)
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Final location inside the resource folder
    pub fn export_path(&self) -> &Path {
        &self.export_path
    }
}

fn new_attachment_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A page of the notebook hierarchy being exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Title as shown in the notebook
    pub title: String,
    /// Depth in the section/page hierarchy (0 = top level)
    pub level: u32,
    /// Path segments of the enclosing notebook/section, outermost first
    pub section_path: Vec<String>,
    attachments: Vec<Attachment>,
}

impl Page {
    /// Create a page with no attachments
    pub fn new(title: impl Into<String>, level: u32) -> Self {
        Self {
            title: title.into(),
            level,
            section_path: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Set the enclosing section path
    pub fn with_section_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.section_path = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Title with characters that are invalid in file names replaced
    pub fn title_with_no_invalid_chars(&self) -> String {
        sanitize_file_name(&self.title)
    }

    /// Page markdown path relative to the export root, forward slashes
    pub fn relative_file_path(&self) -> String {
        let mut parts: Vec<String> = self
            .section_path
            .iter()
            .map(|s| sanitize_file_name(s))
            .collect();
        parts.push(format!("{}.md", self.title_with_no_invalid_chars()));
        parts.join("/")
    }

    /// Attachments registered so far, in first-seen order
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Find the attachment registered for a converter-emitted source path
    pub fn find_attachment(&self, source_path: &str) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|a| a.source_path == source_path)
    }

    pub(crate) fn push_attachments(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        self.attachments.extend(attachments);
    }
}

/// Replace characters that are not allowed in file names.
///
/// Trailing dots and spaces are trimmed because Windows drops them silently.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_end_matches(['.', ' ']).trim_start();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
