//! Command-line interface definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Note export post-processor
///
/// Converts exported note pages to markdown and cleans up the converter's
/// output: inline images become attachments in a resource folder, and
/// header, blockquote and blank-line artifacts are removed.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments or unsupported input format
///   3  - Input file not found
///  10  - External dependency failed (pandoc, file system)
#[derive(Parser)]
#[command(name = "notemd")]
#[command(about = "Markdown post-processing for note exports", long_about = None)]
pub struct Cli {
    /// Config file (default: notemd.toml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep temporary files and log full error details
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub passes: PassSwitches,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that turn off individual post-processing passes
#[derive(Args, Debug, Clone, Default)]
pub struct PassSwitches {
    /// Leave converter <img> tags in place and do not move images
    #[arg(long, global = true)]
    pub no_images: bool,

    /// Keep blockquote markers
    #[arg(long, global = true)]
    pub keep_quotes: bool,

    /// Keep runs of whitespace-only lines
    #[arg(long, global = true)]
    pub keep_linebreaks: bool,

    /// Keep the title/date/time header block
    #[arg(long, global = true)]
    pub keep_header: bool,
}

/// Output location options shared by the page commands
#[derive(Args, Debug, Clone)]
pub struct PageOutput {
    /// Markdown file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Attachment folder (default: `_resources` next to the output file)
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// Page title (default: input file stem)
    #[arg(long)]
    pub title: Option<String>,

    /// Depth of the page in the notebook hierarchy
    #[arg(long, default_value_t = 0)]
    pub level: u32,

    /// Reference attachments by id (`:/<id>`) instead of relative path
    #[arg(long)]
    pub absolute: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a document to markdown and post-process it
    ///
    /// `.docx` input runs through pandoc; `.md` input is read as-is.
    Convert {
        /// Input document
        input: PathBuf,

        #[command(flatten)]
        out: PageOutput,

        /// Converter scratch directory
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },

    /// Post-process markdown that a converter already produced
    PostProcess {
        /// Converter markdown output
        input: PathBuf,

        #[command(flatten)]
        out: PageOutput,

        /// Directory that <img src> paths are relative to (default: input's directory)
        #[arg(long)]
        source_root: Option<PathBuf>,
    },

    /// Run only the text passes and print the result
    Normalize {
        /// Markdown file
        input: PathBuf,
    },
}
