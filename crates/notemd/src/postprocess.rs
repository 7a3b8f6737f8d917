//! Post-processing pipeline for one converted page.
//!
//! Runs the image pass and then the text passes in a fixed order, gated by
//! the switches in [`PostProcessingConfig`]. The image pass is the only
//! one that can fail; a failure is logged and the page continues through
//! the remaining passes with its markdown untouched by the image pass.

use crate::config::PostProcessingConfig;
use crate::document::normalize::{normalize, strip_carriage_returns};
use crate::document::{relocate_attachments, resolve_and_rewrite, RelocationReport, RewriteTarget};
use crate::domain::{Attachment, Page};
use crate::errors::PostProcessError;
use std::path::PathBuf;
use tracing::warn;

/// Per-page inputs for [`PostProcessor::post_process`]
#[derive(Debug, Clone)]
pub struct PostProcessRequest {
    /// Resource folder, markdown destination and addressing mode
    pub target: RewriteTarget,
    /// Directory that relative `<img src>` values resolve against
    pub source_root: PathBuf,
}

/// Outcome of the image pass
#[derive(Debug)]
pub enum ImagePass {
    /// Disabled in the configuration
    Skipped,
    /// Tags were rewritten and the new attachments handed to relocation
    Rewritten {
        attachments: Vec<Attachment>,
        relocation: RelocationReport,
    },
    /// The scan failed; the markdown was left as the converter produced it
    Failed { reason: PostProcessError },
}

impl ImagePass {
    pub fn is_failed(&self) -> bool {
        matches!(self, ImagePass::Failed { .. })
    }
}

/// Final markdown plus what happened in the image pass
#[derive(Debug)]
pub struct PostProcessOutcome {
    pub markdown: String,
    pub images: ImagePass,
}

/// Sequences the post-processing passes
#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
    config: PostProcessingConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostProcessingConfig {
        &self.config
    }

    /// Post-process one page's converter output.
    ///
    /// Order: carriage returns, images, then the text passes of
    /// [`normalize`]. New attachments are appended to `page`.
    pub fn post_process(
        &self,
        page: &mut Page,
        markdown: &str,
        request: &PostProcessRequest,
    ) -> PostProcessOutcome {
        let mut text = strip_carriage_returns(markdown);

        let images = if self.config.md_img_ref {
            self.extract_images(page, &mut text, request)
        } else {
            ImagePass::Skipped
        };

        PostProcessOutcome {
            markdown: normalize(&text, &self.config.normalize_options()),
            images,
        }
    }

    fn extract_images(
        &self,
        page: &mut Page,
        text: &mut String,
        request: &PostProcessRequest,
    ) -> ImagePass {
        match resolve_and_rewrite(page, text, &request.target) {
            Ok(rewrite) => {
                // Every reference is rewritten before any source file is removed
                let relocation = relocate_attachments(&rewrite.new_attachments, &request.source_root);
                *text = rewrite.markdown;
                ImagePass::Rewritten {
                    attachments: rewrite.new_attachments,
                    relocation,
                }
            }
            Err(reason) => {
                if self.config.debug {
                    warn!(
                        page = %page.relative_file_path(),
                        error = ?reason,
                        "Image extraction skipped"
                    );
                } else {
                    warn!(
                        page = %page.relative_file_path(),
                        "Image extraction skipped: {}",
                        reason
                    );
                }
                ImagePass::Failed { reason }
            }
        }
    }
}
