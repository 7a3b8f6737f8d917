//! Text normalization passes
//!
//! Regex substitutions that clean up artifacts the converter leaves behind.
//! Every pass is pure, never fails, and returns its input unchanged when the
//! trigger pattern does not occur.

use regex::Regex;
use std::sync::LazyLock;

/// Title line, blank, subtitle line, blank, `HH:MM` timestamp, whitespace.
static CONVERTER_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+\n\n.+\n\n\d{2}:\d{2}\s+")
        .expect("CONVERTER_HEADER: hardcoded regex is valid")
});

/// Three to ten lines holding only spaces or tabs.
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\n[\t ]+){3,10}").expect("BLANK_RUN: hardcoded regex is valid")
});

/// Blockquote marker at line start plus any trailing spaces and newlines.
static BLOCKQUOTE_MARKER_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n>[ \n]*").expect("BLOCKQUOTE_MARKER_RUN: hardcoded regex is valid")
});

/// Which normalization passes to run.
///
/// The quotation-block and consecutive-linebreak switches both trigger
/// [`strip_blockquote_markers`], once per enabled switch. The header switch
/// strips the header block and then collapses blank runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub remove_quotation_blocks: bool,
    pub remove_consecutive_linebreaks: bool,
    pub remove_header: bool,
}

impl NormalizeOptions {
    /// All passes enabled
    pub fn all() -> Self {
        Self {
            remove_quotation_blocks: true,
            remove_consecutive_linebreaks: true,
            remove_header: true,
        }
    }

    /// All passes disabled
    pub fn none() -> Self {
        Self {
            remove_quotation_blocks: false,
            remove_consecutive_linebreaks: false,
            remove_header: false,
        }
    }
}

/// Run the enabled passes.
///
/// Order: quotation blocks, consecutive linebreaks, header block.
/// Carriage returns are always removed first.
pub fn normalize(text: &str, options: &NormalizeOptions) -> String {
    let mut text = strip_carriage_returns(text);

    if options.remove_quotation_blocks {
        text = strip_blockquote_markers(&text);
    }
    if options.remove_consecutive_linebreaks {
        text = strip_blockquote_markers(&text);
    }
    if options.remove_header {
        text = strip_header_block(&text);
    }

    text
}

/// Remove every `\r` so the other passes only see `\n` line endings
pub fn strip_carriage_returns(text: &str) -> String {
    text.replace('\r', "")
}

/// Remove the title/date/time block the converter puts at the top of a page
pub fn strip_converter_header(text: &str) -> String {
    CONVERTER_HEADER.replace(text, "").into_owned()
}

/// Strip the header block, then collapse blank runs left anywhere in the page
pub fn strip_header_block(text: &str) -> String {
    collapse_blank_runs(&strip_converter_header(text))
}

/// Collapse runs of 3 to 10 whitespace-only lines into one blank line
pub fn collapse_blank_runs(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").into_owned()
}

/// Remove `>` markers at line start together with the blank space after them.
///
/// Unwraps the single-level blockquotes the converter emits around page
/// content, and drops the empty quoted lines between them.
pub fn strip_blockquote_markers(text: &str) -> String {
    BLOCKQUOTE_MARKER_RUN.replace_all(text, "").into_owned()
}
