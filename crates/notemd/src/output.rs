//! CLI reporting.
//!
//! Human-readable lines go to stdout and warnings to stderr. With `--json`
//! a run prints exactly one [`Envelope`] on stdout instead, whether it
//! succeeded or failed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};

/// Version of the JSON envelope layout
const ENVELOPE_VERSION: &str = "0.1.0";

/// Reporting settings for one CLI run
pub struct OutputContext {
    quiet: bool,
    json: bool,
    command: &'static str,
}

impl OutputContext {
    pub fn new(quiet: bool, json: bool, command: &'static str) -> Self {
        Self {
            quiet,
            json,
            command,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Result line (shown unless --json)
    pub fn line(&self, msg: impl Display) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        write_line(Stream::Stdout, msg)
    }

    /// Progress detail (suppressed by --quiet or --json)
    pub fn note(&self, msg: impl Display) -> io::Result<()> {
        if self.quiet || self.json {
            return Ok(());
        }
        write_line(Stream::Stdout, msg)
    }

    /// Non-fatal problem with the page (suppressed by --quiet or --json)
    pub fn warn(&self, msg: impl Display) -> io::Result<()> {
        if self.quiet || self.json {
            return Ok(());
        }
        write_line(Stream::Stderr, format_args!("Warning: {}", msg))
    }

    /// Print the success envelope (only with --json)
    pub fn emit<T: Serialize>(&self, data: T) -> io::Result<()> {
        if !self.json {
            return Ok(());
        }
        let text = Envelope::success(data, self.command)
            .to_json_string()
            .map_err(io::Error::other)?;
        write_line(Stream::Stdout, text)
    }

    /// Report the error that ended the run; never silenced by --quiet
    pub fn fail(&self, code: ExitCode, error: &anyhow::Error) -> io::Result<()> {
        if !self.json {
            return write_line(Stream::Stderr, format_args!("Error: {:#}", error));
        }
        let text = Envelope::failure(code, format!("{:#}", error), self.command)
            .to_json_string()
            .map_err(io::Error::other)?;
        write_line(Stream::Stdout, text)
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Write one line; a closed pipe (`notemd ... | head`) ends the process quietly
fn write_line(stream: Stream, msg: impl Display) -> io::Result<()> {
    let result = match stream {
        Stream::Stdout => writeln!(io::stdout().lock(), "{}", msg),
        Stream::Stderr => writeln!(io::stderr().lock(), "{}", msg),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => std::process::exit(0),
        other => other,
    }
}

/// JSON document printed by a `--json` run
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    pub metadata: Metadata,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: Metadata::new(command),
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Envelope<()> {
    pub fn failure(code: ExitCode, message: String, command: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorDetail {
                code: code.error_code(),
                exit_code: code.code(),
                message,
            }),
            metadata: Metadata::new(command),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Symbolic code, e.g. "NOT_FOUND"
    pub code: &'static str,
    /// Process exit status the run ends with
    pub exit_code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    /// RFC 3339 time the envelope was produced
    pub generated_at: DateTime<Utc>,
    pub envelope_version: &'static str,
    pub notemd_version: &'static str,
    pub command: String,
}

impl Metadata {
    fn new(command: &str) -> Self {
        Self {
            generated_at: Utc::now(),
            envelope_version: ENVELOPE_VERSION,
            notemd_version: env!("CARGO_PKG_VERSION"),
            command: command.to_string(),
        }
    }
}

/// Standardized exit codes for the notemd CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded (0)
    Success = 0,

    /// Generic error (1)
    GenericError = 1,

    /// Invalid arguments or unsupported input format (2)
    InvalidArgument = 2,

    /// Input file not found (3)
    NotFound = 3,

    /// External dependency failed - converter, file system (10)
    ExternalError = 10,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Error code string used in JSON error envelopes
    pub fn error_code(self) -> &'static str {
        match self {
            ExitCode::Success => "OK",
            ExitCode::GenericError => "ERROR",
            ExitCode::InvalidArgument => "INVALID_ARGUMENT",
            ExitCode::NotFound => "NOT_FOUND",
            ExitCode::ExternalError => "EXTERNAL_ERROR",
        }
    }

    /// Map an error chain to an exit code
    pub fn from_error(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                return match io_error.kind() {
                    io::ErrorKind::NotFound => ExitCode::NotFound,
                    _ => ExitCode::ExternalError,
                };
            }
        }

        let error_msg = error.to_string().to_lowercase();
        if error_msg.contains("not found") {
            ExitCode::NotFound
        } else if error_msg.contains("unsupported") || error_msg.contains("invalid") {
            ExitCode::InvalidArgument
        } else if error_msg.contains("pandoc") {
            ExitCode::ExternalError
        } else {
            ExitCode::GenericError
        }
    }
}
