//! notemd command-line entry point
//!
//! Converts exported note pages to markdown, moves their images into a
//! resource folder, and strips converter artifacts.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use notemd::cli::{Cli, Commands, PageOutput, PassSwitches};
use notemd::config::{NotemdConfig, PostProcessingConfig, DEFAULT_CONFIG_FILE};
use notemd::document::{normalize, ConverterRegistry, RewriteTarget};
use notemd::domain::{AddressingMode, Page};
use notemd::export::{export_page, write_markdown, ExportRequest, PageExport, PageExportSummary};
use notemd::output::{ExitCode, OutputContext};
use notemd::postprocess::{PostProcessRequest, PostProcessor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output = OutputContext::new(cli.quiet, cli.json, command_name(&cli.command));

    let exit_code = match run(cli, &output) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            let code = ExitCode::from_error(&e);
            if output.fail(code, &e).is_err() {
                eprintln!("Error: {:#}", e);
            }
            code
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Convert { .. } => "convert",
        Commands::PostProcess { .. } => "post-process",
        Commands::Normalize { .. } => "normalize",
    }
}

fn run(cli: Cli, output: &OutputContext) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if cli.config.is_some() && !config_path.exists() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }
    let config = NotemdConfig::load(&config_path)?;

    let pp_config = apply_switches(config.post_processing(), &cli.passes, cli.debug);
    let processor = PostProcessor::new(pp_config);

    match cli.command {
        Commands::Convert {
            input,
            out,
            work_dir,
        } => {
            let work_dir = work_dir.unwrap_or_else(|| config.export().work_dir());
            let registry = ConverterRegistry::with_builtins(work_dir, pp_config.debug);
            let converter = registry
                .resolve(&input)
                .ok_or_else(|| anyhow!("Unsupported input format: {}", input.display()))?;

            let mut page = page_for(&input, &out);
            let request = export_request(&out, &config);
            let export = export_page(converter, &processor, &mut page, &input, &request)?;
            report(output, &export.summary(&page))?;
        }

        Commands::PostProcess {
            input,
            out,
            source_root,
        } => {
            let markdown = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let source_root = source_root
                .unwrap_or_else(|| input.parent().unwrap_or(Path::new("")).to_path_buf());

            let mut page = page_for(&input, &out);
            let request = export_request(&out, &config);
            let pp_request = PostProcessRequest {
                target: RewriteTarget::new(
                    &request.resource_folder,
                    &request.md_file_path,
                    request.mode,
                ),
                source_root,
            };

            let outcome = processor.post_process(&mut page, &markdown, &pp_request);
            write_markdown(&request.md_file_path, &outcome.markdown)?;

            let export = PageExport {
                md_file_path: request.md_file_path,
                outcome,
                unreferenced_media: Vec::new(),
            };
            report(output, &export.summary(&page))?;
        }

        Commands::Normalize { input } => {
            let markdown = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let normalized = normalize(&markdown, &pp_config.normalize_options());

            if output.is_json() {
                output.emit(normalized)?;
            } else {
                output.line(normalized.trim_end_matches('\n'))?;
            }
        }
    }

    Ok(())
}

/// Command-line switches only ever turn passes off or debug on
fn apply_switches(
    config: PostProcessingConfig,
    switches: &PassSwitches,
    debug: bool,
) -> PostProcessingConfig {
    PostProcessingConfig {
        md_img_ref: config.md_img_ref && !switches.no_images,
        remove_quotation_blocks: config.remove_quotation_blocks && !switches.keep_quotes,
        remove_consecutive_linebreaks: config.remove_consecutive_linebreaks
            && !switches.keep_linebreaks,
        remove_onenote_header: config.remove_onenote_header && !switches.keep_header,
        debug: config.debug || debug,
    }
}

fn page_for(input: &Path, out: &PageOutput) -> Page {
    let title = out.title.clone().unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });
    Page::new(title, out.level)
}

fn export_request(out: &PageOutput, config: &NotemdConfig) -> ExportRequest {
    let resource_folder = out.resources.clone().unwrap_or_else(|| {
        out.output
            .parent()
            .unwrap_or(Path::new(""))
            .join(config.export().resource_folder())
    });
    let mode = if out.absolute {
        AddressingMode::Absolute
    } else {
        config.addressing_mode()
    };

    ExportRequest {
        md_file_path: out.output.clone(),
        resource_folder,
        mode,
    }
}

fn report(output: &OutputContext, summary: &PageExportSummary) -> Result<()> {
    if output.is_json() {
        output.emit(summary)?;
        return Ok(());
    }

    if let Some(reason) = &summary.image_pass_error {
        output.warn(format!("Images left unprocessed: {}", reason))?;
    }
    for failure in &summary.relocation_failures {
        output.warn(format!("Attachment not moved: {}", failure))?;
    }
    for file in &summary.unreferenced_media {
        output.warn(format!("Extracted media not referenced: {}", file))?;
    }

    output.line(format!("Wrote {}", summary.md_file))?;
    output.note(format!(
        "{} attachment(s), {} image file(s) moved",
        summary.attachments.len(),
        summary.images_moved
    ))?;
    Ok(())
}
