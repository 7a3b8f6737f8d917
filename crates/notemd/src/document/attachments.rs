//! Image extraction and reference rewriting
//!
//! Scans converter output for HTML `<img>` tags, registers each referenced
//! file as an [`Attachment`] of the page, and replaces the tag with a
//! markdown image reference addressed according to an [`AddressingMode`].

use crate::document::paths::{relative_path, to_forward_slashes};
use crate::domain::{AddressingMode, Attachment, Page};
use crate::errors::PostProcessError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Self-closing `<img ... />` tag as emitted by the converter.
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img [^>]+/>").expect("IMG_TAG: hardcoded regex is valid"));

/// `src="..."` attribute anywhere inside an image tag.
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\ssrc="(?P<src>[^"]+)""#).expect("SRC_ATTR: hardcoded regex is valid")
});

/// Where rewritten references must point
#[derive(Debug, Clone)]
pub struct RewriteTarget {
    /// Directory that will hold the page's attachments
    pub resource_folder: PathBuf,
    /// Path the final markdown file will be written to
    pub md_file_path: PathBuf,
    pub mode: AddressingMode,
}

impl RewriteTarget {
    pub fn new(
        resource_folder: impl Into<PathBuf>,
        md_file_path: impl Into<PathBuf>,
        mode: AddressingMode,
    ) -> Self {
        Self {
            resource_folder: resource_folder.into(),
            md_file_path: md_file_path.into(),
            mode,
        }
    }

    /// Reference to substitute for an attachment in the markdown
    pub fn reference_for(&self, attachment: &Attachment) -> String {
        match self.mode {
            AddressingMode::Absolute => format!(":/{}", attachment.id()),
            AddressingMode::Relative => {
                let md_dir = self.md_file_path.parent().unwrap_or(Path::new(""));
                let to_resources = relative_path(md_dir, &self.resource_folder);
                to_forward_slashes(&to_resources.join(attachment.file_name()))
            }
        }
    }
}

/// Result of a successful scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Markdown with every `<img>` tag replaced
    pub markdown: String,
    /// Attachments registered on the page by this scan, in first-seen order
    pub new_attachments: Vec<Attachment>,
}

/// Replace `<img>` tags with markdown image references.
///
/// Each distinct `src` value maps to exactly one attachment on the page:
/// attachments already on the page are reused, unseen sources get a new
/// attachment. New attachments are added to the page only once the whole
/// document scanned cleanly, so a malformed tag leaves the page untouched.
///
/// # Errors
///
/// Returns [`PostProcessError::MalformedImageTag`] for a tag without a
/// parsable `src` attribute.
pub fn resolve_and_rewrite(
    page: &mut Page,
    markdown: &str,
    target: &RewriteTarget,
) -> Result<Rewrite, PostProcessError> {
    let mut output = String::with_capacity(markdown.len());
    let mut new_attachments: Vec<Attachment> = Vec::new();
    let mut last_end = 0;

    for tag in IMG_TAG.find_iter(markdown) {
        let src = parse_src(tag.as_str())?;

        let attachment = match page.find_attachment(src) {
            Some(existing) => existing.clone(),
            None => match new_attachments.iter().find(|a| a.source_path() == src) {
                Some(pending) => pending.clone(),
                None => {
                    let created = Attachment::new_image(src, &target.resource_folder);
                    debug!(
                        page = %page.title,
                        src,
                        id = created.id(),
                        "Registered image attachment"
                    );
                    new_attachments.push(created.clone());
                    created
                }
            },
        };

        output.push_str(&markdown[last_end..tag.start()]);
        output.push_str(&image_markdown(&attachment, target));
        last_end = tag.end();
    }
    output.push_str(&markdown[last_end..]);

    page.push_attachments(new_attachments.iter().cloned());

    Ok(Rewrite {
        markdown: output,
        new_attachments,
    })
}

/// Extract the `src` attribute value from a single image tag
fn parse_src(tag: &str) -> Result<&str, PostProcessError> {
    SRC_ATTR
        .captures(tag)
        .and_then(|caps| caps.name("src"))
        .map(|m| m.as_str())
        .ok_or_else(|| PostProcessError::MalformedImageTag {
            tag: tag.to_string(),
        })
}

fn image_markdown(attachment: &Attachment, target: &RewriteTarget) -> String {
    format!(
        "![{}]({})",
        attachment.file_name(),
        target.reference_for(attachment)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::paths::normalize_path;

    fn absolute_target() -> RewriteTarget {
        RewriteTarget::new("out/_resources", "out/Notebook/Page.md", AddressingMode::Absolute)
    }

    fn relative_target() -> RewriteTarget {
        RewriteTarget::new("out/_resources", "out/Notebook/Page.md", AddressingMode::Relative)
    }

    #[test]
    fn test_absolute_reference_uses_attachment_id() {
        let mut page = Page::new("Page", 0);
        let rewrite = resolve_and_rewrite(
            &mut page,
            "Before <img src=\"media/img1.png\" /> after",
            &absolute_target(),
        )
        .unwrap();

        assert_eq!(page.attachments().len(), 1);
        let att = &page.attachments()[0];
        assert_eq!(
            rewrite.markdown,
            format!("Before ![{}](:/{}) after", att.file_name(), att.id())
        );
        assert_eq!(rewrite.new_attachments, vec![att.clone()]);
        assert_eq!(att.export_path(), Path::new("out/_resources").join(att.file_name()));
    }

    #[test]
    fn test_relative_reference_points_at_export_path() {
        let mut page = Page::new("Page", 0);
        let target = relative_target();
        let rewrite =
            resolve_and_rewrite(&mut page, "<img src=\"media/a.jpeg\" />", &target).unwrap();

        let att = &page.attachments()[0];
        let expected_ref = format!("../_resources/{}", att.file_name());
        assert_eq!(
            rewrite.markdown,
            format!("![{}]({})", att.file_name(), expected_ref)
        );

        let md_dir = target.md_file_path.parent().unwrap();
        assert_eq!(
            normalize_path(&md_dir.join(&expected_ref)),
            normalize_path(att.export_path())
        );
    }

    #[test]
    fn test_relative_reference_from_markdown_above_working_dir() {
        let mut page = Page::new("Page", 0);
        let target = RewriteTarget::new("_resources", "../out/Page.md", AddressingMode::Relative);
        let rewrite = resolve_and_rewrite(&mut page, "<img src=\"a.png\" />", &target).unwrap();

        let att = &page.attachments()[0];
        let reference = rewrite
            .markdown
            .strip_prefix(&format!("![{}](", att.file_name()))
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap();
        assert!(reference.ends_with(&format!("_resources/{}", att.file_name())));

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            normalize_path(&cwd.join("../out").join(reference)),
            normalize_path(&cwd.join(att.export_path()))
        );
    }

    #[test]
    fn test_relative_reference_same_directory() {
        let mut page = Page::new("Page", 0);
        let target = RewriteTarget::new("out", "out/Page.md", AddressingMode::Relative);
        let rewrite =
            resolve_and_rewrite(&mut page, "<img src=\"x.gif\" />", &target).unwrap();

        let att = &page.attachments()[0];
        assert_eq!(
            rewrite.markdown,
            format!("![{}]({})", att.file_name(), att.file_name())
        );
    }

    #[test]
    fn test_duplicate_src_resolves_to_one_attachment() {
        let mut page = Page::new("Page", 0);
        let markdown = "<img src=\"media/a.png\" />\ntext\n<img src=\"media/a.png\" style=\"width:2in\" />";
        let rewrite = resolve_and_rewrite(&mut page, markdown, &absolute_target()).unwrap();

        assert_eq!(page.attachments().len(), 1);
        assert_eq!(rewrite.new_attachments.len(), 1);

        let reference = format!(":/{}", page.attachments()[0].id());
        assert_eq!(rewrite.markdown.matches(&reference).count(), 2);
    }

    #[test]
    fn test_existing_attachment_is_reused_and_not_new() {
        let mut page = Page::new("Page", 0);
        resolve_and_rewrite(&mut page, "<img src=\"media/a.png\" />", &absolute_target()).unwrap();
        let first_id = page.attachments()[0].id().to_string();

        let rewrite = resolve_and_rewrite(
            &mut page,
            "<img src=\"media/a.png\" /><img src=\"media/b.png\" />",
            &absolute_target(),
        )
        .unwrap();

        assert_eq!(page.attachments().len(), 2);
        assert_eq!(rewrite.new_attachments.len(), 1);
        assert_eq!(rewrite.new_attachments[0].source_path(), "media/b.png");
        assert!(rewrite.markdown.starts_with(&format!(
            "![{}.png](:/{})",
            first_id, first_id
        )));
    }

    #[test]
    fn test_extra_attributes_are_ignored() {
        let mut page = Page::new("Page", 0);
        let markdown = "<img alt=\"diagram\" SRC=\"media/d.png\" width=\"300\" />";
        let rewrite = resolve_and_rewrite(&mut page, markdown, &absolute_target()).unwrap();

        assert_eq!(page.attachments()[0].source_path(), "media/d.png");
        assert!(!rewrite.markdown.contains("<img"));
    }

    #[test]
    fn test_missing_src_is_an_error_and_leaves_page_untouched() {
        let mut page = Page::new("Page", 0);
        let markdown = "<img src=\"media/ok.png\" /> then <img alt=\"no source\" />";
        let err = resolve_and_rewrite(&mut page, markdown, &absolute_target()).unwrap_err();

        assert_eq!(
            err,
            PostProcessError::MalformedImageTag {
                tag: "<img alt=\"no source\" />".to_string()
            }
        );
        assert!(page.attachments().is_empty());
    }

    #[test]
    fn test_markdown_without_images_is_unchanged() {
        let mut page = Page::new("Page", 0);
        let markdown = "# Title\n\n![already](markdown.png)\n<img>";
        let rewrite = resolve_and_rewrite(&mut page, markdown, &relative_target()).unwrap();

        assert_eq!(rewrite.markdown, markdown);
        assert!(rewrite.new_attachments.is_empty());
        assert!(page.attachments().is_empty());
    }
}
