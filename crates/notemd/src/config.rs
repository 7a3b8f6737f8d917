//! Configuration file loading and parsing.
//!
//! notemd reads optional settings from `notemd.toml`. Every key may be
//! omitted; accessors fall back to defaults. Command-line flags are applied
//! on top by the binary.

use crate::document::NormalizeOptions;
use crate::domain::AddressingMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "notemd.toml";

/// Root configuration structure loaded from `notemd.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotemdConfig {
    /// Keep temporary files and log full error details (default: false).
    pub debug: Option<bool>,
    /// Post-processing pass switches (optional).
    pub post_processing: Option<PostProcessingSection>,
    /// Output layout settings (optional).
    pub export: Option<ExportSection>,
}

/// `[post_processing]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostProcessingSection {
    /// Replace converter `<img>` tags and move images (default: true).
    pub md_img_ref: Option<bool>,
    /// Strip blockquote marker artifacts (default: true).
    pub remove_quotation_blocks: Option<bool>,
    /// Collapse runs of whitespace-only lines (default: true).
    pub remove_consecutive_linebreaks: Option<bool>,
    /// Strip the title/date/time header block (default: true).
    pub remove_onenote_header: Option<bool>,
}

/// `[export]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportSection {
    /// Use `:/<id>` references instead of relative paths (default: false).
    pub absolute_attachment_ref: Option<bool>,
    /// Attachment folder, relative to the output directory (default: "_resources").
    pub resource_folder: Option<String>,
    /// Converter scratch directory (default: "_tmp").
    pub work_dir: Option<String>,
}

impl ExportSection {
    pub fn absolute_attachment_ref(&self) -> bool {
        self.absolute_attachment_ref.unwrap_or(false)
    }

    pub fn resource_folder(&self) -> PathBuf {
        PathBuf::from(self.resource_folder.as_deref().unwrap_or("_resources"))
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(self.work_dir.as_deref().unwrap_or("_tmp"))
    }
}

/// Resolved switches consumed by [`crate::postprocess::PostProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessingConfig {
    pub md_img_ref: bool,
    pub remove_quotation_blocks: bool,
    pub remove_consecutive_linebreaks: bool,
    pub remove_onenote_header: bool,
    pub debug: bool,
}

impl Default for PostProcessingConfig {
    fn default() -> Self {
        Self {
            md_img_ref: true,
            remove_quotation_blocks: true,
            remove_consecutive_linebreaks: true,
            remove_onenote_header: true,
            debug: false,
        }
    }
}

impl PostProcessingConfig {
    /// Switches for the text-only passes
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            remove_quotation_blocks: self.remove_quotation_blocks,
            remove_consecutive_linebreaks: self.remove_consecutive_linebreaks,
            remove_header: self.remove_onenote_header,
        }
    }
}

impl NotemdConfig {
    /// Load configuration from `path` if it exists.
    ///
    /// Returns an empty config (all fields None) if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: NotemdConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// Export settings with defaults applied
    pub fn export(&self) -> ExportSection {
        self.export.clone().unwrap_or_default()
    }

    pub fn addressing_mode(&self) -> AddressingMode {
        AddressingMode::from_absolute(self.export().absolute_attachment_ref())
    }

    /// Pass switches with defaults applied
    pub fn post_processing(&self) -> PostProcessingConfig {
        let section = self.post_processing.clone().unwrap_or_default();
        let defaults = PostProcessingConfig::default();

        PostProcessingConfig {
            md_img_ref: section.md_img_ref.unwrap_or(defaults.md_img_ref),
            remove_quotation_blocks: section
                .remove_quotation_blocks
                .unwrap_or(defaults.remove_quotation_blocks),
            remove_consecutive_linebreaks: section
                .remove_consecutive_linebreaks
                .unwrap_or(defaults.remove_consecutive_linebreaks),
            remove_onenote_header: section
                .remove_onenote_header
                .unwrap_or(defaults.remove_onenote_header),
            debug: self.debug(),
        }
    }
}
