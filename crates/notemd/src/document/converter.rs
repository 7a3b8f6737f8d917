//! Document converter trait and registry
//!
//! Converting a source document to markdown is delegated to an external tool.
//! Each converter implements [`DocumentConverter`] and returns the raw
//! markdown together with the media files it extracted, so the
//! post-processing passes never depend on how conversion happened.

use crate::domain::Page;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Raw converter output for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Markdown as emitted by the converter
    pub markdown: String,
    /// Media files the converter wrote (absolute or relative to `source_root`)
    pub media: Vec<PathBuf>,
    /// Directory that `<img src>` values in `markdown` are relative to
    pub source_root: PathBuf,
}

/// Trait for document-to-markdown converters
///
/// # Example
///
/// ```
/// use notemd::document::{DocumentConverter, MarkdownPassthrough};
/// use std::path::Path;
///
/// let converter = MarkdownPassthrough;
/// assert_eq!(converter.id(), "markdown");
/// assert!(converter.supports_path(Path::new("page.md")));
/// ```
pub trait DocumentConverter {
    /// Returns the converter identifier (e.g., "pandoc", "markdown")
    fn id(&self) -> &str;

    /// Check if this converter accepts the given input file based on extension
    fn supports_path(&self, path: &Path) -> bool;

    /// Convert one page's input document to markdown
    fn convert(&self, input: &Path, page: &Page) -> Result<ConvertedDocument>;
}

/// Registry for managing document converters
///
/// # Example
///
/// ```
/// use notemd::document::ConverterRegistry;
/// use std::path::Path;
///
/// let registry = ConverterRegistry::with_builtins("_tmp", false);
/// let converter = registry.resolve(Path::new("export.docx")).unwrap();
/// assert_eq!(converter.id(), "pandoc");
/// assert!(registry.resolve(Path::new("notes.txt")).is_none());
/// ```
pub struct ConverterRegistry {
    converters: Vec<Box<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Create a registry with the pandoc and markdown converters registered
    pub fn with_builtins(work_dir: impl Into<PathBuf>, debug: bool) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PandocConverter::new(work_dir, debug)));
        registry.register(Box::new(MarkdownPassthrough));
        registry
    }

    /// Register a converter
    pub fn register(&mut self, converter: Box<dyn DocumentConverter>) {
        self.converters.push(converter);
    }

    /// Resolve the first converter that accepts the input path
    pub fn resolve(&self, path: &Path) -> Option<&dyn DocumentConverter> {
        self.converters
            .iter()
            .find(|c| c.supports_path(path))
            .map(|c| c.as_ref())
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins("_tmp", false)
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Converts `.docx` documents by running `pandoc`.
///
/// Media is extracted under `<work dir>/media`. Pandoc is handed absolute
/// paths, so the `<img src>` values it writes are absolute as well.
pub struct PandocConverter {
    work_dir: PathBuf,
    debug: bool,
}

impl PandocConverter {
    /// `debug` keeps the input document and intermediate markdown on disk
    pub fn new(work_dir: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            work_dir: work_dir.into(),
            debug,
        }
    }

    fn arguments(&self, input: &Path, md_file: &Path) -> Vec<String> {
        vec![
            input.display().to_string(),
            "--to".to_string(),
            "gfm".to_string(),
            "-o".to_string(),
            md_file.display().to_string(),
            // Without it pandoc hard-wraps lines into stray quote blocks
            "--wrap=none".to_string(),
            format!("--extract-media={}", self.work_dir.display()),
        ]
    }
}

impl DocumentConverter for PandocConverter {
    fn id(&self) -> &str {
        "pandoc"
    }

    fn supports_path(&self, path: &Path) -> bool {
        has_extension(path, &["docx"])
    }

    fn convert(&self, input: &Path, page: &Page) -> Result<ConvertedDocument> {
        let pandoc = which::which("pandoc").context("pandoc executable not found in PATH")?;

        fs::create_dir_all(&self.work_dir).with_context(|| {
            format!("Failed to create work directory {}", self.work_dir.display())
        })?;
        let work_dir = self
            .work_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", self.work_dir.display()))?;
        let input = input
            .canonicalize()
            .with_context(|| format!("Input document not found: {}", input.display()))?;
        let md_file = work_dir.join(format!("{}.md", page.title_with_no_invalid_chars()));

        info!(page = %page.title, input = %input.display(), "Running pandoc");
        let output = Command::new(&pandoc)
            .args(self.arguments(&input, &md_file))
            .output()
            .context("Failed to start pandoc")?;

        if !output.status.success() {
            bail!(
                "pandoc failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let markdown = fs::read_to_string(&md_file)
            .with_context(|| format!("Failed to read pandoc output {}", md_file.display()))?;

        let media = list_files(&work_dir.join("media"))?;
        debug!(count = media.len(), "Collected extracted media");

        if !self.debug {
            fs::remove_file(&input)
                .with_context(|| format!("Failed to remove {}", input.display()))?;
            fs::remove_file(&md_file)
                .with_context(|| format!("Failed to remove {}", md_file.display()))?;
        }

        Ok(ConvertedDocument {
            markdown,
            media,
            source_root: work_dir,
        })
    }
}

/// Reads markdown that was already converted, e.g. by an earlier run.
///
/// `<img src>` values are resolved against the markdown file's directory.
pub struct MarkdownPassthrough;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img [^>]*\bsrc="([^"]+)"[^>]*/>"#)
        .expect("IMG_SRC: hardcoded regex is valid")
});

impl DocumentConverter for MarkdownPassthrough {
    fn id(&self) -> &str {
        "markdown"
    }

    fn supports_path(&self, path: &Path) -> bool {
        has_extension(path, &["md", "markdown"])
    }

    fn convert(&self, input: &Path, _page: &Page) -> Result<ConvertedDocument> {
        let markdown = fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let source_root = input.parent().unwrap_or(Path::new("")).to_path_buf();

        let mut media: Vec<PathBuf> = Vec::new();
        for cap in IMG_SRC.captures_iter(&markdown) {
            let path = source_root.join(&cap[1]);
            if path.is_file() && !media.contains(&path) {
                media.push(path);
            }
        }

        Ok(ConvertedDocument {
            markdown,
            media,
            source_root,
        })
    }
}

/// Recursively collect the files below a directory
fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if root.is_dir() {
        visit_dir(root, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn visit_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).context("Failed to read directory")?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if path.is_dir() {
            visit_dir(&path, files)?;
        } else {
            files.push(path);
        }
    }

    Ok(())
}
