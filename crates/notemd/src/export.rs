//! Single-page export: convert, post-process, write.

use crate::document::paths::normalize_path;
use crate::document::{resolve_source, DocumentConverter, RewriteTarget};
use crate::domain::{AddressingMode, Page};
use crate::postprocess::{ImagePass, PostProcessOutcome, PostProcessRequest, PostProcessor};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where one page's output goes
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Path of the markdown file to write
    pub md_file_path: PathBuf,
    /// Directory receiving the page's attachments
    pub resource_folder: PathBuf,
    pub mode: AddressingMode,
}

/// Result of exporting one page
#[derive(Debug)]
pub struct PageExport {
    pub md_file_path: PathBuf,
    pub outcome: PostProcessOutcome,
    /// Converter media files that no attachment on the page points at
    pub unreferenced_media: Vec<PathBuf>,
}

/// Machine-readable summary of a page export
#[derive(Debug, Clone, Serialize)]
pub struct PageExportSummary {
    pub page: String,
    pub md_file: String,
    pub attachments: Vec<String>,
    pub images_moved: usize,
    pub relocation_failures: Vec<String>,
    /// Set when the image pass was skipped because of malformed input
    pub image_pass_error: Option<String>,
    pub unreferenced_media: Vec<String>,
}

impl PageExport {
    pub fn summary(&self, page: &Page) -> PageExportSummary {
        let (images_moved, relocation_failures, image_pass_error) = match &self.outcome.images {
            ImagePass::Skipped => (0, Vec::new(), None),
            ImagePass::Rewritten { relocation, .. } => {
                let summary = relocation.summary();
                (summary.moved, summary.failed, None)
            }
            ImagePass::Failed { reason } => (0, Vec::new(), Some(reason.to_string())),
        };

        PageExportSummary {
            page: page.title.clone(),
            md_file: self.md_file_path.display().to_string(),
            attachments: page
                .attachments()
                .iter()
                .map(|a| a.file_name().to_string())
                .collect(),
            images_moved,
            relocation_failures,
            image_pass_error,
            unreferenced_media: self
                .unreferenced_media
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }
}

/// Convert one page's input document and write the post-processed markdown.
///
/// Errors abort this page only; callers exporting many pages continue with
/// the next one.
pub fn export_page(
    converter: &dyn DocumentConverter,
    processor: &PostProcessor,
    page: &mut Page,
    input: &Path,
    request: &ExportRequest,
) -> Result<PageExport> {
    let converted = converter
        .convert(input, page)
        .with_context(|| format!("Failed to convert page '{}'", page.title))?;

    let pp_request = PostProcessRequest {
        target: RewriteTarget::new(&request.resource_folder, &request.md_file_path, request.mode),
        source_root: converted.source_root.clone(),
    };
    let outcome = processor.post_process(page, &converted.markdown, &pp_request);

    let unreferenced_media = unreferenced_media(page, &converted.media, &converted.source_root);
    for path in &unreferenced_media {
        warn!(
            page = %page.title,
            file = %path.display(),
            "Extracted media not referenced by any image"
        );
    }

    write_markdown(&request.md_file_path, &outcome.markdown)?;
    info!(
        page = %page.title,
        file = %request.md_file_path.display(),
        attachments = page.attachments().len(),
        "Exported page"
    );

    Ok(PageExport {
        md_file_path: request.md_file_path.clone(),
        outcome,
        unreferenced_media,
    })
}

/// Media files that do not match the source of any attachment on `page`
fn unreferenced_media(page: &Page, media: &[PathBuf], source_root: &Path) -> Vec<PathBuf> {
    let referenced: Vec<PathBuf> = page
        .attachments()
        .iter()
        .map(|a| normalize_path(&resolve_source(a.source_path(), source_root)))
        .collect();

    media
        .iter()
        .filter(|file| !referenced.contains(&normalize_path(&source_root.join(file))))
        .cloned()
        .collect()
}

/// Write markdown, creating parent directories as needed
pub fn write_markdown(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, markdown).with_context(|| format!("Failed to write {}", path.display()))
}
